//! RSA primitive adapter (component I). PEM/DER parsing and RSA math are
//! delegated to the `rsa` crate behind a narrow trait, so the rest of the
//! crate (and its tests) never depend on a concrete key representation.

use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::{Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};

use crate::errors::DKIMError;
use crate::hash::HashAlgo;

/// RSA signing/verification, abstracted so alternate backends (or
/// deterministic fakes in tests) can stand in for the `rsa` crate.
pub trait RsaPrimitive {
    fn sign(&self, key: &RsaPrivateKey, algo: HashAlgo, digest: &[u8]) -> Result<Vec<u8>, DKIMError>;
    fn verify(&self, key: &RsaPublicKey, algo: HashAlgo, digest: &[u8], signature: &[u8]) -> Result<bool, DKIMError>;
}

/// Default `RsaPrimitive` backed by the `rsa` crate's PKCS#1 v1.5 scheme.
pub struct DefaultRsaPrimitive;

impl RsaPrimitive for DefaultRsaPrimitive {
    fn sign(&self, key: &RsaPrivateKey, algo: HashAlgo, digest: &[u8]) -> Result<Vec<u8>, DKIMError> {
        check_digest_fits(key, algo)?;
        let scheme = padding_scheme(algo);
        key.sign(scheme, digest)
            .map_err(|err| DKIMError::InternalError(format!("RSA signing failed: {}", err)))
    }

    fn verify(&self, key: &RsaPublicKey, algo: HashAlgo, digest: &[u8], signature: &[u8]) -> Result<bool, DKIMError> {
        if check_digest_fits_public(key, algo).is_err() {
            return Ok(false);
        }
        let scheme = padding_scheme(algo);
        Ok(key.verify(scheme, digest, signature).is_ok())
    }
}

fn padding_scheme(algo: HashAlgo) -> Pkcs1v15Sign {
    match algo {
        HashAlgo::RsaSha1 => Pkcs1v15Sign::new::<sha1::Sha1>(),
        HashAlgo::RsaSha256 => Pkcs1v15Sign::new::<sha2::Sha256>(),
    }
}

/// `digest` is too large for `key`'s modulus once wrapped in a PKCS#1 v1.5
/// DigestInfo structure (RFC 8017 §9.2), with at least 11 bytes of padding.
/// The `rsa` crate surfaces this as an opaque error variant; we compute it
/// explicitly so callers can distinguish it (spec.md component I).
fn check_digest_fits(key: &RsaPrivateKey, algo: HashAlgo) -> Result<(), DKIMError> {
    check_digest_fits_len(rsa::traits::PublicKeyParts::size(key), algo)
}

fn check_digest_fits_public(key: &RsaPublicKey, algo: HashAlgo) -> Result<(), DKIMError> {
    check_digest_fits_len(rsa::traits::PublicKeyParts::size(key), algo)
}

fn check_digest_fits_len(modulus_bytes: usize, algo: HashAlgo) -> Result<(), DKIMError> {
    let digest_len = match algo {
        HashAlgo::RsaSha1 => 20,
        HashAlgo::RsaSha256 => 32,
    };
    let digest_info_len = algo.der_prefix_len() + digest_len;
    if digest_info_len + 11 > modulus_bytes {
        return Err(DKIMError::InternalError(format!(
            "digest too large for key: {} bytes needed, key provides {} bytes",
            digest_info_len + 11,
            modulus_bytes
        )));
    }
    Ok(())
}

/// Parse a PEM-encoded RSA private key. Tries PKCS#1 (`BEGIN RSA PRIVATE
/// KEY`) first, since that is what the RFC 6376 world and this crate's own
/// signer tooling (`openssl genrsa` / `-traditional`) produce, then falls
/// back to PKCS#8 (`BEGIN PRIVATE KEY`).
pub fn parse_private_key_pem(pem: &str) -> Result<RsaPrivateKey, DKIMError> {
    if let Ok(key) = RsaPrivateKey::from_pkcs1_pem(pem) {
        return Ok(key);
    }
    RsaPrivateKey::from_pkcs8_pem(pem)
        .map_err(|err| DKIMError::KeyFormatError(format!("failed to parse private key: {}", err)))
}

/// Parse a DER-encoded RSA public key, as delivered in a DKIM `p=` tag.
/// Tries `SubjectPublicKeyInfo` first (spec.md §6.3), then falls back to
/// a bare PKCS#1 `RSAPublicKey`, which is what RFC 6376's own examples and
/// much of the deployed DNS actually publish.
pub fn parse_public_key_der(der: &[u8]) -> Result<RsaPublicKey, DKIMError> {
    if let Ok(key) = RsaPublicKey::from_public_key_der(der) {
        return Ok(key);
    }
    RsaPublicKey::from_pkcs1_der(der)
        .map_err(|err| DKIMError::KeyFormatError(format!("failed to parse public key: {}", err)))
}
