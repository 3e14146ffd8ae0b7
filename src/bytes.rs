// Small byte-slice helpers used by the canonicalizers and the RFC822
// parser. Kept separate so the canonicalization logic reads like the
// RFC text rather than a wall of index arithmetic.

/// Replace every occurrence of `from` with `to`, returning a new buffer.
pub(crate) fn replace_slice(buf: &[u8], from: &[u8], to: &[u8]) -> Vec<u8> {
    if from.is_empty() {
        return buf.to_vec();
    }
    let mut out = Vec::with_capacity(buf.len());
    let mut i = 0;
    while i < buf.len() {
        if buf[i..].starts_with(from) {
            out.extend_from_slice(to);
            i += from.len();
        } else {
            out.push(buf[i]);
            i += 1;
        }
    }
    out
}

/// Trim ASCII whitespace (space, tab, CR, LF) from both ends.
pub(crate) fn trim_ascii_whitespace(buf: &[u8]) -> &[u8] {
    let is_ws = |b: &u8| matches!(*b, b' ' | b'\t' | b'\r' | b'\n');
    let start = buf.iter().position(|b| !is_ws(b)).unwrap_or(buf.len());
    let end = buf.iter().rposition(|b| !is_ws(b)).map_or(start, |p| p + 1);
    &buf[start..end]
}
