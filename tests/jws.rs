//! JWS end-to-end tests: flattened and compact round trips, the `b64`
//! unencoded-payload option, and error distinctness.

mod keys;

use std::collections::BTreeMap;
use std::str::FromStr;

use base64ct::{Base64UrlUnpadded as Base64, Encoding};
use rand::RngCore;
use serde_json::{json, Map, Value};
use vercre_jose::jose::jws;
use vercre_jose::{Algorithm, Curve, Error, Jws, JwsBuilder, SignOptions, VerifyOptions};

fn map(value: Value) -> Map<String, Value> {
    value.as_object().expect("should be an object").clone()
}

// Sign "test" with ES256 and check the compact round trip shape.
#[tokio::test]
async fn es256_compact_round_trip() {
    let signer = keys::generate(Curve::P256);

    let jws = JwsBuilder::new()
        .protected_header(map(json!({"alg": "ES256"})))
        .sign(b"test", &signer, &SignOptions::default())
        .await
        .expect("should sign");

    let compact = jws.encode().expect("should encode");
    let segments: Vec<&str> = compact.split('.').collect();
    assert_eq!(segments.len(), 3);
    assert!(segments.iter().all(|s| !s.is_empty()));

    let verified = jws::verify_compact(&compact, &signer.public_key(), &VerifyOptions::default())
        .await
        .expect("should verify");
    assert_eq!(verified.payload, b"test");
    assert_eq!(verified.protected_header, map(json!({"alg": "ES256"})));
    assert!(verified.unprotected_header.is_none());
}

// Every supported signature algorithm round-trips in flattened form.
#[tokio::test]
async fn all_curves() {
    let cases = [
        (Curve::P256, "ES256"),
        (Curve::P384, "ES384"),
        (Curve::P521, "ES512"),
        (Curve::Secp256k1, "ES256K"),
        (Curve::Ed25519, "EdDSA"),
    ];

    for (curve, alg) in cases {
        let signer = keys::generate(curve);
        let jws = JwsBuilder::new()
            .protected_header(map(json!({"alg": alg})))
            .sign(b"signed bytes", &signer, &SignOptions::default())
            .await
            .unwrap_or_else(|e| panic!("should sign with {alg}: {e}"));

        let verified = jws::verify(&jws, &signer.public_key(), &VerifyOptions::default())
            .await
            .unwrap_or_else(|e| panic!("should verify with {alg}: {e}"));
        assert_eq!(verified.payload, b"signed bytes");
    }
}

// RFC 7797: with `b64: false` the payload is signed raw and travels
// detached; the container's payload field is empty.
#[tokio::test]
async fn unencoded_detached_payload() {
    let signer = keys::generate(Curve::P256);
    let mut payload = vec![0u8; 1024];
    rand::rngs::OsRng.fill_bytes(&mut payload);

    let jws = JwsBuilder::new()
        .protected_header(map(json!({"alg": "ES256", "b64": false, "crit": ["b64"]})))
        .sign(&payload, &signer, &SignOptions::default())
        .await
        .expect("should sign");
    assert_eq!(jws.payload, "");

    let verified =
        jws::verify_detached(&jws, &payload, &signer.public_key(), &VerifyOptions::default())
            .await
            .expect("should verify");
    assert_eq!(verified.payload, payload);

    // without the detached payload the verification cannot proceed
    let err = jws::verify(&jws, &signer.public_key(), &VerifyOptions::default())
        .await
        .expect_err("should fail");
    assert!(matches!(err, Error::JwsInvalid(_)));

    // and the compact serialization has no channel for it
    let err = jws.encode().expect_err("should fail");
    assert!(err.to_string().contains("flattened"));
}

// `b64` only takes effect when opted into via `crit`.
#[tokio::test]
async fn b64_requires_crit_opt_in() {
    let signer = keys::generate(Curve::P256);

    let jws = JwsBuilder::new()
        .protected_header(map(json!({"alg": "ES256", "b64": false})))
        .sign(b"inline", &signer, &SignOptions::default())
        .await
        .expect("should sign");

    // not opted in: the payload is encoded as usual
    assert_eq!(jws.payload, Base64::encode_string(b"inline"));
    let verified = jws::verify(&jws, &signer.public_key(), &VerifyOptions::default())
        .await
        .expect("should verify");
    assert_eq!(verified.payload, b"inline");
}

// A JWS signed in compact form verifies re-cast to flattened form, and vice
// versa.
#[tokio::test]
async fn cross_serialization() {
    let signer = keys::generate(Curve::Ed25519);

    let jws = JwsBuilder::new()
        .protected_header(map(json!({"alg": "EdDSA"})))
        .sign(b"either form", &signer, &SignOptions::default())
        .await
        .expect("should sign");

    let compact = jws.encode().expect("should encode");
    let recast = Jws::from_str(&compact).expect("should parse");
    let verified = jws::verify(&recast, &signer.public_key(), &VerifyOptions::default())
        .await
        .expect("should verify");
    assert_eq!(verified.payload, b"either form");

    let verified = jws::verify_compact(&compact, &signer.public_key(), &VerifyOptions::default())
        .await
        .expect("should verify");
    assert_eq!(verified.payload, b"either form");
}

// A bad signature is distinguishable from a malformed container.
#[tokio::test]
async fn bad_signature_is_distinct() {
    let signer = keys::generate(Curve::P256);

    let jws = JwsBuilder::new()
        .protected_header(map(json!({"alg": "ES256"})))
        .sign(b"original", &signer, &SignOptions::default())
        .await
        .expect("should sign");

    let tampered = Jws {
        payload: Base64::encode_string(b"forged"),
        ..jws.clone()
    };
    let err = jws::verify(&tampered, &signer.public_key(), &VerifyOptions::default())
        .await
        .expect_err("should fail");
    assert!(matches!(err, Error::SignatureVerification));

    // the wrong key also fails verification, not shape validation
    let other = keys::generate(Curve::P256);
    let err = jws::verify(&jws, &other.public_key(), &VerifyOptions::default())
        .await
        .expect_err("should fail");
    assert!(matches!(err, Error::SignatureVerification));
}

#[tokio::test]
async fn algorithm_allow_list() {
    let signer = keys::generate(Curve::P256);
    let jws = JwsBuilder::new()
        .protected_header(map(json!({"alg": "ES256"})))
        .sign(b"allowed?", &signer, &SignOptions::default())
        .await
        .expect("should sign");

    let verified = jws::verify(
        &jws,
        &signer.public_key(),
        &VerifyOptions {
            algorithms: Some(vec![Algorithm::ES256]),
            ..VerifyOptions::default()
        },
    )
    .await
    .expect("should verify");
    assert_eq!(verified.payload, b"allowed?");

    let err = jws::verify(
        &jws,
        &signer.public_key(),
        &VerifyOptions {
            algorithms: Some(vec![Algorithm::ES256K]),
            ..VerifyOptions::default()
        },
    )
    .await
    .expect_err("should fail");
    assert!(matches!(err, Error::NotSupported(_)));
}

// The `alg` header must agree with the key's curve.
#[tokio::test]
async fn alg_must_match_key() {
    let signer = keys::generate(Curve::Ed25519);

    let err = JwsBuilder::new()
        .protected_header(map(json!({"alg": "ES256"})))
        .sign(b"x", &signer, &SignOptions::default())
        .await
        .expect_err("should fail");
    assert!(matches!(err, Error::JwsInvalid(_)));

    // and on verification: a valid EdDSA JWS against a P-256 key
    let jws = JwsBuilder::new()
        .protected_header(map(json!({"alg": "EdDSA"})))
        .sign(b"x", &signer, &SignOptions::default())
        .await
        .expect("should sign");
    let other = keys::generate(Curve::P256);
    let err = jws::verify(&jws, &other.public_key(), &VerifyOptions::default())
        .await
        .expect_err("should fail");
    assert!(matches!(err, Error::JwsInvalid(_)));
}

#[tokio::test]
async fn compact_segment_counts() {
    let verifier = keys::generate(Curve::P256);

    for compact in ["", "a.b", "a.b.c.d"] {
        let err = jws::verify_compact(compact, &verifier.public_key(), &VerifyOptions::default())
            .await
            .expect_err("should fail");
        assert!(matches!(err, Error::JwsInvalid(_)), "wrong error for `{compact}`");
    }
}

#[tokio::test]
async fn unprotected_header_round_trip() {
    let signer = keys::generate(Curve::P256);

    let jws = JwsBuilder::new()
        .protected_header(map(json!({"alg": "ES256"})))
        .unprotected_header(map(json!({"kid": "key-1"})))
        .sign(b"with header", &signer, &SignOptions::default())
        .await
        .expect("should sign");

    let verified = jws::verify(&jws, &signer.public_key(), &VerifyOptions::default())
        .await
        .expect("should verify");
    assert_eq!(verified.unprotected_header, Some(map(json!({"kid": "key-1"}))));

    // positions must stay disjoint
    let err = JwsBuilder::new()
        .protected_header(map(json!({"alg": "ES256"})))
        .unprotected_header(map(json!({"alg": "ES256"})))
        .sign(b"x", &signer, &SignOptions::default())
        .await
        .expect_err("should fail");
    assert!(err.to_string().contains("`alg`"));
}

// Custom critical extension parameters are gated on the caller's option
// set, on both sides.
#[tokio::test]
async fn custom_critical_parameters() {
    let signer = keys::generate(Curve::P256);
    let protected = map(json!({"alg": "ES256", "crit": ["exp"], "exp": 1234}));

    let err = JwsBuilder::new()
        .protected_header(protected.clone())
        .sign(b"x", &signer, &SignOptions::default())
        .await
        .expect_err("should fail");
    assert!(err.to_string().contains("not recognized"));

    let mut crit = BTreeMap::new();
    crit.insert("exp".to_string(), true);

    let jws = JwsBuilder::new()
        .protected_header(protected)
        .sign(
            b"critical",
            &signer,
            &SignOptions {
                crit: Some(crit.clone()),
            },
        )
        .await
        .expect("should sign");

    let err = jws::verify(&jws, &signer.public_key(), &VerifyOptions::default())
        .await
        .expect_err("should fail");
    assert!(err.to_string().contains("not recognized"));

    let verified = jws::verify(
        &jws,
        &signer.public_key(),
        &VerifyOptions {
            crit: Some(crit),
            ..VerifyOptions::default()
        },
    )
    .await
    .expect("should verify");
    assert_eq!(verified.payload, b"critical");
}

#[tokio::test]
async fn builder_setters_are_single_use() {
    let signer = keys::generate(Curve::P256);

    let err = JwsBuilder::new()
        .protected_header(map(json!({"alg": "ES256"})))
        .protected_header(map(json!({"alg": "ES256"})))
        .sign(b"x", &signer, &SignOptions::default())
        .await
        .expect_err("should fail");
    assert!(err.to_string().contains("`protected_header` may only be set once"));
}

// The flattened serialization is plain JSON on the wire.
#[tokio::test]
async fn flattened_json_wire_form() {
    let signer = keys::generate(Curve::P384);

    let jws = JwsBuilder::new()
        .protected_header(map(json!({"alg": "ES384"})))
        .sign(b"wire", &signer, &SignOptions::default())
        .await
        .expect("should sign");

    let text = serde_json::to_string(&jws).expect("should serialize");
    let parsed: Jws = serde_json::from_str(&text).expect("should deserialize");
    assert_eq!(parsed, jws);

    let verified = jws::verify(&parsed, &signer.public_key(), &VerifyOptions::default())
        .await
        .expect("should verify");
    assert_eq!(verified.payload, b"wire");
}

// X25519 keys agree, they do not sign.
#[tokio::test]
async fn agreement_curves_cannot_sign() {
    let signer = keys::generate(Curve::X25519);

    let err = JwsBuilder::new()
        .protected_header(map(json!({"alg": "EdDSA"})))
        .sign(b"x", &signer, &SignOptions::default())
        .await
        .expect_err("should fail");
    assert!(matches!(err, Error::NotSupported(_)));
}
