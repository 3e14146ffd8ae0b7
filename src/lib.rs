// Implementation of DKIM: https://datatracker.ietf.org/doc/html/rfc6376
//
// This crate covers the core only: canonicalization, message parsing,
// the tag=value signature grammar, and the signing/verification
// pipelines. PEM/DER parsing and RSA math are delegated to the `rsa`
// crate through `crypto::RsaPrimitive`; DNS resolution is delegated to
// a caller-supplied `dns::Resolver`.

#[macro_use]
extern crate quick_error;

mod bytes;
pub mod canonicalization;
pub mod crypto;
pub mod dns;
mod errors;
mod fold;
mod hash;
pub mod message;
mod parser;
pub mod signature;
mod sign;
mod verify;

pub use crypto::RsaPrimitive;
pub use errors::DKIMError;
pub use hash::HashAlgo;
pub use message::Message;
pub use parser::{parse as parse_tag_list, Tag};
pub use sign::{sign, SignParams, Signer, SignerBuilder};
pub use signature::Signature;
pub use verify::{validate_header, verify, VerifyParams};
