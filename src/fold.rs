//! Header folder (component F): wrap a single-line header value to at
//! most 72 columns per line, using `"\r\n "` continuations.

/// Fold `header` at column 72. Scans from the left; if the remainder fits
/// in 72 bytes, emit it as-is. Otherwise find the rightmost space in the
/// first 72 bytes and break there; if no space exists, force-advance by
/// 72 bytes so we always make progress (spec.md §9 open question: the
/// straight port of the original can produce a zero-length split and spin
/// forever on a long unbroken token — this is the fix).
pub fn fold(header: &str) -> String {
    // A pre-existing "\r\n " sequence defines the starting prefix; fold
    // only the remainder after it.
    let (mut pre, mut rest) = match header.find("\r\n ") {
        Some(i) => (header[..i + 3].to_string(), header[i + 3..].to_string()),
        None => (String::new(), header.to_string()),
    };

    while rest.len() > 72 {
        match rest[..72].rfind(' ') {
            Some(i) => {
                pre.push_str(&rest[..i]);
                pre.push_str("\r\n ");
                rest = rest[i + 1..].to_string();
            }
            None => {
                pre.push_str(&rest[..72]);
                pre.push_str("\r\n ");
                rest = rest[72..].to_string();
            }
        }
    }
    pre.push_str(&rest);
    pre
}
