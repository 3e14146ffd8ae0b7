//! RFC 822 parser (component B). Splits raw message bytes into an ordered
//! list of (name, value) header pairs and a body, tolerating both `LF` and
//! `CRLF` line endings and RFC 5322-style header folding. No character-set
//! decoding happens here: everything stays a byte string, and the only
//! case folding applied anywhere in this crate is ASCII a-z/A-Z.

use crate::errors::DKIMError;

/// A single RFC 822 header: `name` excludes the trailing colon, `value` is
/// everything after it (including folded continuation lines), always
/// terminated by `\r\n`.
pub type Header = (Vec<u8>, Vec<u8>);

/// A parsed message: ordered headers plus a CRLF-joined body.
#[derive(Debug, Clone)]
pub struct Message {
    pub headers: Vec<Header>,
    pub body: Vec<u8>,
}

fn is_wsp(b: u8) -> bool {
    b == b'\x09' || b == b'\x20'
}

/// `[\x21-\x7e]` minus `:`, i.e. a legal header-name octet.
fn is_header_name_byte(b: u8) -> bool {
    (0x21..=0x7e).contains(&b) && b != b':'
}

/// Find the end of a leading run of header-name bytes followed immediately
/// by `:`, returning the index of the `:` if the line starts with one.
fn header_name_end(line: &[u8]) -> Option<usize> {
    let mut i = 0;
    while i < line.len() && is_header_name_byte(line[i]) {
        i += 1;
    }
    if i > 0 && line.get(i) == Some(&b':') {
        Some(i)
    } else {
        None
    }
}

/// Split `message` into `\r\n`-delimited lines, tolerating a bare `\n`.
fn split_lines(message: &[u8]) -> Vec<Vec<u8>> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < message.len() {
        if message[i] == b'\n' {
            let end = if i > start && message[i - 1] == b'\r' {
                i - 1
            } else {
                i
            };
            lines.push(message[start..end].to_vec());
            start = i + 1;
        }
        i += 1;
    }
    lines.push(message[start..].to_vec());
    lines
}

/// Parse a message in RFC822 format (component B). Accepts `LF` or `CRLF`
/// line endings; header values in the result always end with `\r\n`, and
/// the body is re-joined with `\r\n` separators.
pub fn parse(message: &[u8]) -> Result<Message, DKIMError> {
    let lines = split_lines(message);
    let mut headers: Vec<Header> = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        let line = &lines[i];
        if line.is_empty() {
            i += 1;
            break;
        }
        if is_wsp(line[0]) {
            match headers.last_mut() {
                Some((_, value)) => {
                    value.extend_from_slice(line);
                    value.extend_from_slice(b"\r\n");
                }
                None => {
                    return Err(DKIMError::MessageFormatError(format!(
                        "unexpected continuation line before any header: {:?}",
                        String::from_utf8_lossy(line)
                    )))
                }
            }
        } else if let Some(colon) = header_name_end(line) {
            let name = line[..colon].to_vec();
            let mut value = line[colon + 1..].to_vec();
            value.extend_from_slice(b"\r\n");
            headers.push((name, value));
        } else if line.starts_with(b"From ") {
            // Unix mbox "From " separator line; ignored.
        } else {
            return Err(DKIMError::MessageFormatError(format!(
                "unexpected characters in RFC822 header: {:?}",
                String::from_utf8_lossy(line)
            )));
        }
        i += 1;
    }

    let body = if i >= lines.len() {
        Vec::new()
    } else {
        lines[i..].join(&b"\r\n"[..])
    };

    Ok(Message { headers, body })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_message() {
        let msg = parse(b"Subject: hi\r\n\r\nbody\r\n").unwrap();
        assert_eq!(msg.headers, vec![(b"Subject".to_vec(), b" hi\r\n".to_vec())]);
        assert_eq!(msg.body, b"body\r\n");
    }

    #[test]
    fn test_folding() {
        // RFC822 folding: "Subject: hi\r\n there\r\n\r\nbody\r\n"
        let msg = parse(b"Subject: hi\r\n there\r\n\r\nbody\r\n").unwrap();
        assert_eq!(
            msg.headers,
            vec![(b"Subject".to_vec(), b" hi\r\n there\r\n".to_vec())]
        );
        assert_eq!(msg.body, b"body\r\n");
    }

    #[test]
    fn test_lf_only() {
        let msg = parse(b"Subject: hi\n\nbody\n").unwrap();
        assert_eq!(msg.headers, vec![(b"Subject".to_vec(), b" hi\r\n".to_vec())]);
        assert_eq!(msg.body, b"body\r\n");
    }

    #[test]
    fn test_no_blank_line_means_empty_body() {
        let msg = parse(b"Subject: hi\r\n").unwrap();
        assert_eq!(msg.headers, vec![(b"Subject".to_vec(), b" hi\r\n".to_vec())]);
        assert_eq!(msg.body, b"");
    }

    #[test]
    fn test_mbox_from_line_skipped() {
        let msg = parse(b"From guido@python.org Mon Jan  1 00:00:00 2001\r\nSubject: hi\r\n\r\nbody\r\n").unwrap();
        assert_eq!(msg.headers, vec![(b"Subject".to_vec(), b" hi\r\n".to_vec())]);
    }

    #[test]
    fn test_multiple_headers_preserve_order() {
        let msg = parse(b"A: 1\r\nB: 2\r\nA: 3\r\n\r\n").unwrap();
        assert_eq!(
            msg.headers,
            vec![
                (b"A".to_vec(), b" 1\r\n".to_vec()),
                (b"B".to_vec(), b" 2\r\n".to_vec()),
                (b"A".to_vec(), b" 3\r\n".to_vec()),
            ]
        );
    }

    #[test]
    fn test_bad_header_line_errors() {
        let err = parse(b"not a header\r\n\r\n").unwrap_err();
        assert!(matches!(err, DKIMError::MessageFormatError(_)));
    }
}
