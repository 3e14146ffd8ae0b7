// Integration tests exercising the public sign/verify API end to end,
// rather than the per-module unit tests inside `src/`.

use dkim_core::canonicalization::Type as CanonType;
use dkim_core::dns::StaticResolver;
use dkim_core::{sign, verify, SignParams, VerifyParams};

fn private_key_pem() -> String {
    std::fs::read_to_string("testdata/keys/test.private.pem").unwrap()
}

fn public_key_b64() -> String {
    std::fs::read_to_string("testdata/keys/test.pub.b64").unwrap()
}

fn resolver_for(selector: &str, domain: &str) -> StaticResolver {
    StaticResolver::new().with_record(
        &format!("{}._domainkey.{}", selector, domain),
        &format!("v=DKIM1; p={}", public_key_b64().trim()),
    )
}

#[test]
fn sign_then_verify_simple_canonicalization() {
    let message = b"From: Alice <alice@example.com>\r\n\
To: Bob <bob@example.com>\r\n\
Subject: hello\r\n\
\r\n\
This is the body.\r\n";

    let pem = private_key_pem();
    let params = SignParams::new("sel", "example.com", &pem);
    let mut signed = sign(message, &params).unwrap();
    signed.extend_from_slice(message);

    let resolver = resolver_for("sel", "example.com");
    let verify_params = VerifyParams {
        logger: None,
        resolver: &resolver,
    };
    assert!(verify(&signed, &verify_params).unwrap());
}

#[test]
fn sign_then_verify_relaxed_canonicalization() {
    let message = b"From: Alice <alice@example.com>\r\n\
Subject:   hello   there  \r\n\
\r\n\
Line one.  \r\nLine two.\r\n";

    let pem = private_key_pem();
    let mut params = SignParams::new("sel2", "example.org", &pem);
    params.header_canon = CanonType::Relaxed;
    params.body_canon = CanonType::Relaxed;
    let mut signed = sign(message, &params).unwrap();
    signed.extend_from_slice(message);

    let resolver = resolver_for("sel2", "example.org");
    let verify_params = VerifyParams {
        logger: None,
        resolver: &resolver,
    };
    assert!(verify(&signed, &verify_params).unwrap());
}

#[test]
fn tampering_with_a_signed_header_breaks_verification() {
    let message = b"From: Alice <alice@example.com>\r\n\
Subject: hello\r\n\
\r\n\
body\r\n";

    let pem = private_key_pem();
    let params = SignParams::new("sel3", "example.net", &pem);
    let dkim_header = sign(message, &params).unwrap();

    let mut tampered = dkim_header;
    // Flip the Subject header, which is covered by the default `h=`
    // (every header present, since `include_headers` wasn't overridden).
    let mut body_with_tampered_header = message.to_vec();
    let pos = body_with_tampered_header
        .windows(b"hello".len())
        .position(|w| w == b"hello")
        .unwrap();
    body_with_tampered_header[pos] = b'H';
    tampered.extend_from_slice(&body_with_tampered_header);

    let resolver = resolver_for("sel3", "example.net");
    let verify_params = VerifyParams {
        logger: None,
        resolver: &resolver,
    };
    assert!(!verify(&tampered, &verify_params).unwrap());
}

#[test]
fn unknown_selector_fails_closed() {
    let message = b"From: Alice <alice@example.com>\r\n\r\nbody\r\n";
    let pem = private_key_pem();
    let params = SignParams::new("missing-selector", "example.com", &pem);
    let mut signed = sign(message, &params).unwrap();
    signed.extend_from_slice(message);

    // Resolver knows nothing about "missing-selector".
    let resolver = StaticResolver::new();
    let verify_params = VerifyParams {
        logger: None,
        resolver: &resolver,
    };
    assert!(!verify(&signed, &verify_params).unwrap());
}
