// Inspired from https://docs.rs/dkim/latest/src/dkim/canonicalization.rs.html
//! Canonicalizers (component C): byte-exact `simple`/`relaxed` header and
//! body normalization, per RFC 6376 §3.4. This is the part most easily
//! gotten subtly wrong, so every transformation below is a direct byte
//! scan rather than a regex, matching spec.md's own guidance.

use crate::bytes;
use crate::message::Header;

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Type {
    Simple,
    Relaxed,
}

impl Type {
    pub fn name(&self) -> &'static str {
        match self {
            Type::Simple => "simple",
            Type::Relaxed => "relaxed",
        }
    }

    pub fn by_name(name: &str) -> Option<Type> {
        match name {
            "simple" => Some(Type::Simple),
            "relaxed" => Some(Type::Relaxed),
            _ => None,
        }
    }

    pub fn canonicalize_headers(&self, headers: &[Header]) -> Vec<Header> {
        match self {
            Type::Simple => canonicalize_headers_simple(headers),
            Type::Relaxed => canonicalize_headers_relaxed(headers),
        }
    }

    pub fn canonicalize_body(&self, body: &[u8]) -> Vec<u8> {
        match self {
            Type::Simple => canonicalize_body_simple(body),
            Type::Relaxed => canonicalize_body_relaxed(body),
        }
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Simple / headers: identity. Does not alter ordering or casing.
fn canonicalize_headers_simple(headers: &[Header]) -> Vec<Header> {
    headers.to_vec()
}

/// Simple / body: strip trailing empty lines, collapsing any tail run of
/// `\r\n` to exactly one. An empty body becomes `"\r\n"`.
fn canonicalize_body_simple(body: &[u8]) -> Vec<u8> {
    if body.is_empty() {
        return b"\r\n".to_vec();
    }
    let mut end = body.len();
    while end >= 2 && &body[end - 2..end] == b"\r\n" {
        end -= 2;
    }
    let mut out = body[..end].to_vec();
    out.extend_from_slice(b"\r\n");
    out
}

/// Relaxed / headers: lowercase the name (ASCII only), delete every CRLF
/// in the value, collapse runs of WSP to a single space, trim, then
/// re-append `\r\n`. The name is canonicalized even when the value is
/// empty.
fn canonicalize_headers_relaxed(headers: &[Header]) -> Vec<Header> {
    headers
        .iter()
        .map(|(name, value)| {
            let lowered: Vec<u8> = name.iter().map(|b| b.to_ascii_lowercase()).collect();
            (lowered, canonicalize_header_value_relaxed(value))
        })
        .collect()
}

fn canonicalize_header_value_relaxed(value: &[u8]) -> Vec<u8> {
    let unfolded = bytes::replace_slice(value, b"\r\n", b"");
    let mut collapsed = Vec::with_capacity(unfolded.len());
    let mut in_ws = false;
    for &b in &unfolded {
        if b == b'\t' || b == b' ' {
            if !in_ws {
                collapsed.push(b' ');
                in_ws = true;
            }
        } else {
            collapsed.push(b);
            in_ws = false;
        }
    }
    let trimmed = bytes::trim_ascii_whitespace(&collapsed).to_vec();
    let mut out = trimmed;
    out.extend_from_slice(b"\r\n");
    out
}

/// True if `buf[i..]` starts with a (possibly empty) run of `\t`/` `
/// immediately followed by `\r\n`.
fn wsp_run_ends_in_crlf(buf: &[u8], i: usize) -> bool {
    let mut j = i;
    while j < buf.len() && (buf[j] == b'\t' || buf[j] == b' ') {
        j += 1;
    }
    buf[j..].starts_with(b"\r\n")
}

/// Relaxed / body: delete trailing WSP immediately before each line
/// ending, collapse runs of WSP anywhere to a single space, then collapse
/// the tail run of `\r\n` to exactly one.
fn canonicalize_body_relaxed(body: &[u8]) -> Vec<u8> {
    // Delete WSP immediately preceding a CRLF.
    let mut stripped = Vec::with_capacity(body.len());
    let mut i = 0;
    while i < body.len() {
        if (body[i] == b'\t' || body[i] == b' ') && wsp_run_ends_in_crlf(body, i) {
            i += 1;
            continue;
        }
        stripped.push(body[i]);
        i += 1;
    }

    // Collapse any remaining run of WSP (tab/space) to a single space.
    let mut collapsed = Vec::with_capacity(stripped.len());
    let mut in_ws = false;
    for &b in &stripped {
        if b == b'\t' || b == b' ' {
            if !in_ws {
                collapsed.push(b' ');
                in_ws = true;
            }
        } else {
            collapsed.push(b);
            in_ws = false;
        }
    }

    // Collapse tail (\r\n)* to exactly one trailing \r\n.
    let mut end = collapsed.len();
    while end >= 2 && &collapsed[end - 2..end] == b"\r\n" {
        end -= 2;
    }
    let mut out = collapsed[..end].to_vec();
    out.extend_from_slice(b"\r\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_body_empty() {
        assert_eq!(canonicalize_body_simple(b""), b"\r\n");
    }

    #[test]
    fn test_simple_body_collapses_trailing_blank_lines() {
        assert_eq!(canonicalize_body_simple(b"body\r\n\r\n\r\n"), b"body\r\n");
    }

    #[test]
    fn test_relaxed_body_collapse() {
        assert_eq!(
            canonicalize_body_relaxed(b"a  b \t c  \r\n\r\n"),
            b"a b c\r\n"
        );
    }

    #[test]
    fn test_relaxed_body_empty_is_crlf() {
        assert_eq!(canonicalize_body_relaxed(b""), b"\r\n");
    }

    #[test]
    fn test_relaxed_header() {
        let headers = vec![(b"From".to_vec(), b" Alice  <a@b>\r\n".to_vec())];
        let out = Type::Relaxed.canonicalize_headers(&headers);
        assert_eq!(out, vec![(b"from".to_vec(), b"Alice <a@b>\r\n".to_vec())]);
    }

    #[test]
    fn test_relaxed_header_empty_value() {
        let headers = vec![(b"X-Foo".to_vec(), b"\r\n".to_vec())];
        let out = Type::Relaxed.canonicalize_headers(&headers);
        assert_eq!(out, vec![(b"x-foo".to_vec(), b"\r\n".to_vec())]);
    }

    #[test]
    fn test_simple_headers_identity() {
        let headers = vec![(b"Subject".to_vec(), b" Hi \t\r\n".to_vec())];
        assert_eq!(Type::Simple.canonicalize_headers(&headers), headers);
    }

    #[test]
    fn test_idempotence_simple_body() {
        let body = b"hello\r\n\r\n\r\n".to_vec();
        let once = canonicalize_body_simple(&body);
        let twice = canonicalize_body_simple(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_idempotence_relaxed_body() {
        let body = b"a  b \t\r\n\r\n".to_vec();
        let once = canonicalize_body_relaxed(&body);
        let twice = canonicalize_body_relaxed(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_idempotence_relaxed_headers() {
        let headers = vec![(b"Subject".to_vec(), b"  a   b  \r\n".to_vec())];
        let once = Type::Relaxed.canonicalize_headers(&headers);
        let twice = Type::Relaxed.canonicalize_headers(&once);
        assert_eq!(once, twice);
    }
}
