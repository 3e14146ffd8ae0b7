//! The `DKIM-Signature` tag list (component D): a typed wrapper over the
//! tag=value map plus the field validator from spec.md §4.D.

use indexmap::IndexMap;

use crate::errors::DKIMError;

/// The header name this crate signs and verifies.
pub const HEADER: &str = "DKIM-Signature";

/// Tags that must be present for a signature to be structurally valid.
pub const REQUIRED_TAGS: &[&str] = &["v", "a", "b", "bh", "d", "h", "s"];

/// A parsed `DKIM-Signature` tag list, plus the raw header value it came
/// from (needed later to strip `b=` out before re-hashing, see `hash.rs`).
#[derive(Debug, Clone)]
pub struct Signature {
    pub tags: IndexMap<String, String>,
    pub raw_value: Vec<u8>,
}

impl Signature {
    pub fn get_tag(&self, name: &str) -> Option<&str> {
        self.tags.get(name).map(|s| s.as_str())
    }

    pub fn get_required_tag(&self, name: &str) -> &str {
        self.tags
            .get(name)
            .map(|s| s.as_str())
            .unwrap_or_else(|| panic!("required tag {} missing after validation", name))
    }
}

/// Parse a raw `DKIM-Signature` header value into a `Signature`. Does not
/// run the field validator; callers that need RFC 6376-valid signatures
/// should call `validate_signature_fields` afterwards.
pub fn parse(raw_value: &[u8]) -> Result<Signature, DKIMError> {
    let as_str = std::str::from_utf8(raw_value)
        .map_err(|err| DKIMError::InvalidTagList(format!("non-UTF8 signature header: {}", err)))?;
    let tags = crate::parser::parse(as_str)?;
    Ok(Signature {
        tags,
        raw_value: raw_value.to_vec(),
    })
}

fn is_decimal(s: &str, max_digits: Option<usize>) -> bool {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    max_digits.map_or(true, |max| s.len() <= max)
}

fn is_base64ish(s: &str) -> bool {
    s.bytes()
        .all(|b| b.is_ascii_whitespace() || b.is_ascii_alphanumeric() || b == b'+' || b == b'/' || b == b'=')
}

/// Validate DKIM-Signature fields (component D, spec.md §4.D). Checks run
/// in the exact order the spec lists; the first failure is returned.
pub fn validate_signature_fields(sig: &Signature) -> Result<(), DKIMError> {
    for field in REQUIRED_TAGS {
        if sig.get_tag(field).is_none() {
            return Err(DKIMError::ValidationError(format!(
                "signature missing {}=",
                field
            )));
        }
    }

    let v = sig.get_required_tag("v");
    if v != "1" {
        return Err(DKIMError::ValidationError(format!(
            "v= value is not 1 ({})",
            v
        )));
    }

    let b = sig.get_required_tag("b");
    if !is_base64ish(b) {
        return Err(DKIMError::ValidationError(format!(
            "b= value is not valid base64 ({})",
            b
        )));
    }

    let bh = sig.get_required_tag("bh");
    if !is_base64ish(bh) {
        return Err(DKIMError::ValidationError(format!(
            "bh= value is not valid base64 ({})",
            bh
        )));
    }

    if let Some(i) = sig.get_tag("i") {
        let d = sig.get_required_tag("d");
        let boundary_ok = i.len() > d.len()
            && i.ends_with(d)
            && matches!(i.as_bytes()[i.len() - d.len() - 1], b'@' | b'.');
        if !boundary_ok {
            return Err(DKIMError::ValidationError(format!(
                "i= domain is not a subdomain of d= (i={} d={})",
                i, d
            )));
        }
    }

    if let Some(l) = sig.get_tag("l") {
        if !is_decimal(l, Some(76)) {
            return Err(DKIMError::ValidationError(format!(
                "l= value is not a decimal integer ({})",
                l
            )));
        }
    }

    if let Some(q) = sig.get_tag("q") {
        if q != "dns/txt" {
            return Err(DKIMError::ValidationError(format!(
                "q= value is not dns/txt ({})",
                q
            )));
        }
    }

    if let Some(t) = sig.get_tag("t") {
        if !is_decimal(t, None) {
            return Err(DKIMError::ValidationError(format!(
                "t= value is not a decimal integer ({})",
                t
            )));
        }
    }

    if let Some(x) = sig.get_tag("x") {
        if !is_decimal(x, None) {
            return Err(DKIMError::ValidationError(format!(
                "x= value is not a decimal integer ({})",
                x
            )));
        }
        // spec.md §9 open question: the original compares x against t
        // without checking t's presence. We require t= when x= is
        // present, rather than treating a missing t as an implicit 0.
        let t = sig.get_tag("t").ok_or_else(|| {
            DKIMError::ValidationError("x= is present but t= is missing".to_string())
        })?;
        let t_val: u64 = t.parse().map_err(|_| {
            DKIMError::ValidationError(format!("t= value is not a decimal integer ({})", t))
        })?;
        let x_val: u64 = x.parse().map_err(|_| {
            DKIMError::ValidationError(format!("x= value is not a decimal integer ({})", x))
        })?;
        if x_val < t_val {
            return Err(DKIMError::ValidationError(format!(
                "x= value is less than t= value (x={} t={})",
                x, t
            )));
        }
    }

    Ok(())
}
