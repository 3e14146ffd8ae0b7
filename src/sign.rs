//! Signer pipeline (component G, spec.md §4.G). `sign` is the direct
//! functional contract; `SignerBuilder`/`Signer` wrap it with the
//! ergonomic builder shape this corpus favors for multi-argument
//! construction (see erooster-mail-dkim's `SignerBuilder`).

use base64::Engine as _;
use chrono::Utc;
use slog::{debug, o, Discard, Logger};

use crate::canonicalization::Type as CanonType;
use crate::crypto::{self, DefaultRsaPrimitive, RsaPrimitive};
use crate::errors::DKIMError;
use crate::fold::fold;
use crate::hash::{compute_body_hash, compute_header_hash, HashAlgo};
use crate::message::{self, Header};
use crate::signature::{self, Signature};

/// Parameters accepted by `sign` (spec.md §4.G step 1).
pub struct SignParams<'a> {
    pub selector: &'a str,
    pub domain: &'a str,
    pub private_key_pem: &'a str,
    pub identity: Option<&'a str>,
    pub header_canon: CanonType,
    pub body_canon: CanonType,
    pub include_headers: Option<Vec<String>>,
    pub length: bool,
    pub logger: Option<&'a Logger>,
}

impl<'a> SignParams<'a> {
    pub fn new(selector: &'a str, domain: &'a str, private_key_pem: &'a str) -> Self {
        SignParams {
            selector,
            domain,
            private_key_pem,
            identity: None,
            header_canon: CanonType::Simple,
            body_canon: CanonType::Simple,
            include_headers: None,
            length: false,
            logger: None,
        }
    }
}

/// Produce a complete `DKIM-Signature: ...\r\n` header for `message`,
/// following the exact step order of spec.md §4.G.
pub fn sign(message: &[u8], params: &SignParams) -> Result<Vec<u8>, DKIMError> {
    let discard = Logger::root(Discard, o!());
    let logger = params.logger.unwrap_or(&discard);

    // 1. Parse the message.
    let parsed = message::parse(message)?;

    // 2. Parse the private key.
    let private_key = crypto::parse_private_key_pem(params.private_key_pem)?;

    // 3. Validate identity/domain relationship.
    if let Some(identity) = params.identity {
        if !identity.ends_with(params.domain) {
            return Err(DKIMError::ParameterError(format!(
                "identity {} does not end with domain {}",
                identity, params.domain
            )));
        }
    }

    // 4. Canonicalize headers and body.
    let canon_headers = params.header_canon.canonicalize_headers(&parsed.headers);
    let canon_body = params.body_canon.canonicalize_body(&parsed.body);

    // 5. Body hash.
    let bh = compute_body_hash(HashAlgo::RsaSha256, &canon_body);

    // `include_headers`: default to every header name present, lowercased,
    // duplicates preserved in original order.
    let include_headers: Vec<String> = match &params.include_headers {
        Some(h) => h.clone(),
        None => parsed
            .headers
            .iter()
            .map(|(name, _)| String::from_utf8_lossy(name).to_ascii_lowercase())
            .collect(),
    };

    // 6. Build the tag list in the mandated order.
    let identity_str;
    let identity_tag: Option<&str> = match params.identity {
        Some(i) => Some(i),
        None => {
            identity_str = format!("@{}", params.domain);
            Some(identity_str.as_str())
        }
    };
    let t = Utc::now().timestamp();
    let h_joined = include_headers.join(" : ");
    let c_value = format!("{}/{}", params.header_canon.name(), params.body_canon.name());

    let mut tag_pairs: Vec<(String, String)> = vec![
        ("v".to_string(), "1".to_string()),
        ("a".to_string(), HashAlgo::RsaSha256.name().to_string()),
        ("c".to_string(), c_value),
        ("d".to_string(), params.domain.to_string()),
    ];
    if let Some(i) = identity_tag {
        tag_pairs.push(("i".to_string(), i.to_string()));
    }
    if params.length {
        tag_pairs.push(("l".to_string(), canon_body.len().to_string()));
    }
    tag_pairs.push(("q".to_string(), "dns/txt".to_string()));
    tag_pairs.push(("s".to_string(), params.selector.to_string()));
    tag_pairs.push(("t".to_string(), t.to_string()));
    tag_pairs.push(("h".to_string(), h_joined));
    tag_pairs.push(("bh".to_string(), bh));
    let b_index = tag_pairs.len();
    tag_pairs.push(("b".to_string(), String::new()));

    let serialize = |pairs: &[(String, String)]| -> String {
        pairs
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("; ")
    };

    // 7. Serialize (with b="") and fold.
    let serialized = serialize(&tag_pairs);
    let folded = fold(&serialized);

    // 8. The DKIM-Signature header pair to be canonicalized and appended,
    // with `b=` still empty. `compute_header_hash` canonicalizes it itself
    // (it needs the raw bytes to strip the `b=` value out first).
    let dkim_header_raw: Header = (
        signature::HEADER.as_bytes().to_vec(),
        format!(" {}\r\n", folded).into_bytes(),
    );

    // Build a `Signature` view over the in-progress tag list so
    // `compute_header_hash` can strip `b=` (empty at this point).
    let mut tags = indexmap::IndexMap::new();
    for (k, v) in &tag_pairs {
        tags.insert(k.clone(), v.clone());
    }
    let sig_in_progress = Signature {
        tags,
        raw_value: dkim_header_raw.1.clone(),
    };

    // 9. Compose the header hash with b="".
    let header_hash = compute_header_hash(
        HashAlgo::RsaSha256,
        params.header_canon,
        &canon_headers,
        &include_headers,
        &dkim_header_raw.1,
        &sig_in_progress,
    );

    // 10. Sign.
    let primitive = DefaultRsaPrimitive;
    let signature_bytes = primitive
        .sign(&private_key, HashAlgo::RsaSha256, &header_hash)
        .map_err(|err| {
            debug!(logger, "signing failed"; "error" => format!("{:?}", err));
            DKIMError::ParameterError("digest too large for modulus".to_string())
        })?;

    // 11. Append base64(signature); prepend/append header framing.
    let b_value = base64::engine::general_purpose::STANDARD.encode(&signature_bytes);
    tag_pairs[b_index].1 = b_value;
    let final_folded = fold(&serialize(&tag_pairs));
    let mut out = format!("DKIM-Signature: {}", final_folded).into_bytes();
    out.extend_from_slice(b"\r\n");
    Ok(out)
}

/// Ergonomic builder over `sign`/`SignParams`, grounded in this corpus's
/// `SignerBuilder` convention (erooster-mail-dkim).
pub struct SignerBuilder<'a> {
    selector: Option<&'a str>,
    domain: Option<&'a str>,
    private_key_pem: Option<&'a str>,
    identity: Option<&'a str>,
    header_canon: CanonType,
    body_canon: CanonType,
    include_headers: Option<Vec<String>>,
    length: bool,
    logger: Option<&'a Logger>,
}

impl<'a> Default for SignerBuilder<'a> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> SignerBuilder<'a> {
    pub fn new() -> Self {
        SignerBuilder {
            selector: None,
            domain: None,
            private_key_pem: None,
            identity: None,
            header_canon: CanonType::Simple,
            body_canon: CanonType::Simple,
            include_headers: None,
            length: false,
            logger: None,
        }
    }

    pub fn with_selector(mut self, selector: &'a str) -> Self {
        self.selector = Some(selector);
        self
    }

    pub fn with_signing_domain(mut self, domain: &'a str) -> Self {
        self.domain = Some(domain);
        self
    }

    pub fn with_private_key_pem(mut self, pem: &'a str) -> Self {
        self.private_key_pem = Some(pem);
        self
    }

    pub fn with_identity(mut self, identity: &'a str) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn with_header_canonicalization(mut self, canon: CanonType) -> Self {
        self.header_canon = canon;
        self
    }

    pub fn with_body_canonicalization(mut self, canon: CanonType) -> Self {
        self.body_canon = canon;
        self
    }

    pub fn with_signed_headers(mut self, headers: &[&str]) -> Self {
        self.include_headers = Some(headers.iter().map(|h| h.to_lowercase()).collect());
        self
    }

    pub fn with_length(mut self, length: bool) -> Self {
        self.length = length;
        self
    }

    pub fn with_logger(mut self, logger: &'a Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn build(self) -> Result<Signer<'a>, DKIMError> {
        Ok(Signer {
            params: SignParams {
                selector: self
                    .selector
                    .ok_or_else(|| DKIMError::ParameterError("selector is required".to_string()))?,
                domain: self
                    .domain
                    .ok_or_else(|| DKIMError::ParameterError("signing domain is required".to_string()))?,
                private_key_pem: self
                    .private_key_pem
                    .ok_or_else(|| DKIMError::ParameterError("private key is required".to_string()))?,
                identity: self.identity,
                header_canon: self.header_canon,
                body_canon: self.body_canon,
                include_headers: self.include_headers,
                length: self.length,
                logger: self.logger,
            },
        })
    }
}

pub struct Signer<'a> {
    params: SignParams<'a>,
}

impl<'a> Signer<'a> {
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>, DKIMError> {
        sign(message, &self.params)
    }
}
