//! Verifier pipeline (component H, spec.md §4.H). Never raises: every
//! failure that is not a programmer error collapses to `false`, with the
//! cause recorded through the logger.

use base64::Engine as _;
use slog::{debug, o, Discard, Logger};

use crate::canonicalization::Type as CanonType;
use crate::crypto::{self, DefaultRsaPrimitive, RsaPrimitive};
use crate::dns::{query_name, Resolver};
use crate::errors::DKIMError;
use crate::hash::{compute_header_hash, HashAlgo};
use crate::message;
use crate::signature::{self, Signature};

pub struct VerifyParams<'a> {
    pub logger: Option<&'a Logger>,
    pub resolver: &'a dyn Resolver,
}

/// Verify the first `DKIM-Signature` header of `message`. Returns `Ok(bool)`
/// for every reachable outcome; `Err` is reserved for cases the spec treats
/// as caller misuse rather than signature failure (there are none on this
/// path today, but the `Result` wrapper keeps `message::parse`'s error
/// propagation honest without collapsing it to `false` silently).
pub fn verify(message: &[u8], params: &VerifyParams) -> Result<bool, DKIMError> {
    let discard = Logger::root(Discard, o!());
    let logger = params.logger.unwrap_or(&discard);

    // 1. Parse the message.
    let parsed = message::parse(message)?;

    // 2. Select the first DKIM-Signature header.
    let dkim_header = match parsed
        .headers
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(signature::HEADER.as_bytes()))
    {
        Some(h) => h,
        None => {
            debug!(logger, "no DKIM-Signature header present");
            return Ok(false);
        }
    };

    // 3. Parse as a tag list.
    let sig = match signature::parse(&dkim_header.1) {
        Ok(sig) => sig,
        Err(err) => {
            debug!(logger, "failed to parse DKIM-Signature"; "error" => format!("{:?}", err));
            return Ok(false);
        }
    };

    // 4. Validate fields.
    if let Err(err) = signature::validate_signature_fields(&sig) {
        debug!(logger, "signature field validation failed"; "error" => format!("{:?}", err));
        return Ok(false);
    }

    // 5. Parse c=.
    let c = sig.get_tag("c").unwrap_or("simple/simple");
    let (header_canon, body_canon) = match parse_canon_pair(c) {
        Some(pair) => pair,
        None => {
            debug!(logger, "unknown canonicalization"; "c" => c);
            return Ok(false);
        }
    };

    // 6. Canonicalize headers and body.
    let canon_headers = header_canon.canonicalize_headers(&parsed.headers);
    let mut canon_body = body_canon.canonicalize_body(&parsed.body);

    // 7. Select the hasher.
    let a = sig.get_required_tag("a");
    let hash_algo = match HashAlgo::by_name(a) {
        Some(h) => h,
        None => {
            debug!(logger, "unknown signature algorithm"; "a" => a);
            return Ok(false);
        }
    };

    // 8. l= truncation, applied after canonicalization.
    if let Some(l) = sig.get_tag("l") {
        match l.parse::<usize>() {
            Ok(n) => canon_body.truncate(n),
            Err(_) => {
                debug!(logger, "l= is not a valid length"; "l" => l);
                return Ok(false);
            }
        }
    }

    // 9. Body hash comparison.
    let expected_bh = hash_algo.digest(&canon_body);
    let bh_tag = sig.get_required_tag("bh");
    let bh_clean: String = bh_tag.chars().filter(|c| !c.is_whitespace()).collect();
    let got_bh = match base64::engine::general_purpose::STANDARD.decode(&bh_clean) {
        Ok(b) => b,
        Err(err) => {
            debug!(logger, "bh= is not valid base64"; "error" => format!("{:?}", err));
            return Ok(false);
        }
    };
    if expected_bh != got_bh {
        debug!(logger, "body hash mismatch");
        return Ok(false);
    }

    // 10. DNS query.
    let selector = sig.get_required_tag("s");
    let domain = sig.get_required_tag("d");
    let name = query_name(selector, domain);
    let txt_records = match params.resolver.lookup_txt(&name) {
        Ok(records) if !records.is_empty() => records,
        Ok(_) => {
            debug!(logger, "empty DNS response"; "name" => name);
            return Ok(false);
        }
        Err(err) => {
            debug!(logger, "DNS lookup failed"; "name" => name, "error" => format!("{:?}", err));
            return Ok(false);
        }
    };

    // 11. Parse the TXT record as a TagList; parse p= as a public key.
    let txt_joined = txt_records.concat();
    let key_tags = match crate::parser::parse(&txt_joined) {
        Ok(tags) => tags,
        Err(err) => {
            debug!(logger, "malformed DNS TXT key record"; "error" => format!("{:?}", err));
            return Ok(false);
        }
    };
    let p = match key_tags.get("p") {
        Some(p) => p,
        None => {
            debug!(logger, "DNS TXT key record missing p=");
            return Ok(false);
        }
    };
    let p_clean: String = p.chars().filter(|c| !c.is_whitespace()).collect();
    let der = match base64::engine::general_purpose::STANDARD.decode(&p_clean) {
        Ok(d) => d,
        Err(err) => {
            debug!(logger, "p= is not valid base64"; "error" => format!("{:?}", err));
            return Ok(false);
        }
    };
    let public_key = match crypto::parse_public_key_der(&der) {
        Ok(k) => k,
        Err(err) => {
            debug!(logger, "failed to parse public key"; "error" => format!("{:?}", err));
            return Ok(false);
        }
    };

    // 12. Parse h= and recompute the header hash.
    let h = sig.get_required_tag("h");
    let include_headers: Vec<String> = h
        .split(':')
        .map(|s| s.trim().to_ascii_lowercase())
        .collect();
    let header_hash = compute_header_hash(
        hash_algo,
        header_canon,
        &canon_headers,
        &include_headers,
        &dkim_header.1,
        &sig,
    );

    // 13. RSA verify.
    let b = sig.get_required_tag("b");
    let b_clean: String = b.chars().filter(|c| !c.is_whitespace()).collect();
    let signature_bytes = match base64::engine::general_purpose::STANDARD.decode(&b_clean) {
        Ok(b) => b,
        Err(err) => {
            debug!(logger, "b= is not valid base64"; "error" => format!("{:?}", err));
            return Ok(false);
        }
    };

    let primitive = DefaultRsaPrimitive;
    match primitive.verify(&public_key, hash_algo, &header_hash, &signature_bytes) {
        Ok(result) => Ok(result),
        Err(err) => {
            debug!(logger, "RSA verify failed"; "error" => format!("{:?}", err));
            Ok(false)
        }
    }
}

fn parse_canon_pair(c: &str) -> Option<(CanonType, CanonType)> {
    let mut parts = c.splitn(2, '/');
    let header_name = parts.next()?;
    let body_name = parts.next().unwrap_or("simple");
    let header_canon = CanonType::by_name(header_name)?;
    let body_canon = CanonType::by_name(body_name)?;
    Some((header_canon, body_canon))
}

// Exposed for `signature::parse` + `validate_signature_fields` callers
// that only want structural validation without a full verify (e.g. MTA
// policy checks before queuing for DNS lookup).
pub fn validate_header(raw_value: &[u8]) -> Result<Signature, DKIMError> {
    let sig = signature::parse(raw_value)?;
    signature::validate_signature_fields(&sig)?;
    Ok(sig)
}
