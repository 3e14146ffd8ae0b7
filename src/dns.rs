//! DNS resolution (component I's sibling concern): fetching the DKIM
//! public key TXT record at `<selector>._domainkey.<domain>.`. Pluggable
//! via a `Resolver` trait so verification can run against fixed fakes in
//! tests without touching the network, and so callers can supply their
//! own caching/lookup policy (spec.md §5: the core itself stays
//! synchronous and does not own a DNS client event loop).

use crate::errors::DKIMError;

pub const DNS_NAMESPACE: &str = "_domainkey";

/// Resolves the TXT records published for a DNS name. Implementations
/// return every TXT record string found, in server-returned order; the
/// caller is responsible for selecting/parsing the DKIM key record.
pub trait Resolver {
    fn lookup_txt(&self, name: &str) -> Result<Vec<String>, DKIMError>;
}

/// Build the query name for a selector/domain pair:
/// `<selector>._domainkey.<domain>`.
pub fn query_name(selector: &str, domain: &str) -> String {
    format!("{}.{}.{}", selector, DNS_NAMESPACE, domain)
}

/// A synchronous `Resolver` backed by `trust-dns-resolver`'s blocking
/// client. Not available on wasm32, where no blocking I/O exists; callers
/// on that target must supply their own `Resolver`.
#[cfg(all(feature = "dns", not(target_arch = "wasm32")))]
pub struct TrustDnsResolver {
    inner: trust_dns_resolver::Resolver,
}

#[cfg(all(feature = "dns", not(target_arch = "wasm32")))]
impl TrustDnsResolver {
    pub fn new() -> Result<Self, DKIMError> {
        let inner = trust_dns_resolver::Resolver::new(
            trust_dns_resolver::config::ResolverConfig::default(),
            trust_dns_resolver::config::ResolverOpts::default(),
        )
        .map_err(|err| DKIMError::InternalError(format!("failed to build DNS resolver: {}", err)))?;
        Ok(TrustDnsResolver { inner })
    }
}

#[cfg(all(feature = "dns", not(target_arch = "wasm32")))]
impl Resolver for TrustDnsResolver {
    fn lookup_txt(&self, name: &str) -> Result<Vec<String>, DKIMError> {
        let response = self
            .inner
            .txt_lookup(name)
            .map_err(|err| DKIMError::KeyFormatError(format!("DNS lookup for {} failed: {}", name, err)))?;
        Ok(response.iter().map(|txt| txt.to_string()).collect())
    }
}

/// A fixed-table `Resolver` for tests and for embedders that already have
/// the key material out of band.
pub struct StaticResolver {
    records: std::collections::HashMap<String, Vec<String>>,
}

impl StaticResolver {
    pub fn new() -> Self {
        StaticResolver {
            records: std::collections::HashMap::new(),
        }
    }

    pub fn with_record(mut self, name: &str, txt: &str) -> Self {
        self.records
            .entry(name.to_string())
            .or_default()
            .push(txt.to_string());
        self
    }
}

impl Default for StaticResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver for StaticResolver {
    fn lookup_txt(&self, name: &str) -> Result<Vec<String>, DKIMError> {
        self.records
            .get(name)
            .cloned()
            .ok_or_else(|| DKIMError::KeyFormatError(format!("no TXT record for {}", name)))
    }
}
