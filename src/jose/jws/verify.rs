//! Flattened and compact JWS verification.

use std::str::FromStr;

use serde_json::Value;

use super::{resolve_b64, Jws, Verified, VerifyOptions, DEFAULT_CRIT};
use crate::ecc::sign::SignatureProvider;
use crate::error::{Container, Error};
use crate::jose::jwa::Algorithm;
use crate::jose::jwk::Jwk;
use crate::jose::{b64, header};
use crate::Result;

/// Verify a flattened JWS with the signer's public key, returning the
/// decoded payload and headers.
///
/// Shape errors, algorithm filtering, and a failed signature check remain
/// distinguishable: a well-formed JWS whose signature does not verify
/// raises [`Error::SignatureVerification`], never a generic `invalid`.
///
/// # Errors
///
/// Returns an error if the container or headers are malformed, the
/// algorithm is unsupported or not allowed, or the signature does not
/// verify.
pub async fn verify(jws: &Jws, verifier: &Jwk, options: &VerifyOptions) -> Result<Verified> {
    verify_inner(jws, None, verifier, options).await
}

/// Verify a flattened JWS whose payload travels detached (`"b64": false`,
/// RFC 7797). The raw payload bytes are spliced back into the verification
/// input.
///
/// # Errors
///
/// As for [`verify`]; additionally fails if the JWS does not use
/// `"b64": false`.
pub async fn verify_detached(
    jws: &Jws, payload: &[u8], verifier: &Jwk, options: &VerifyOptions,
) -> Result<Verified> {
    verify_inner(jws, Some(payload), verifier, options).await
}

/// Verify a compact JWS with the signer's public key.
///
/// # Errors
///
/// Returns an error if the input is not a three-segment compact JWS or the
/// contained JWS does not verify.
pub async fn verify_compact(
    compact_jws: &str, verifier: &Jwk, options: &VerifyOptions,
) -> Result<Verified> {
    let jws = Jws::from_str(compact_jws)?;
    verify(&jws, verifier, options).await
}

async fn verify_inner(
    jws: &Jws, detached: Option<&[u8]>, verifier: &Jwk, options: &VerifyOptions,
) -> Result<Verified> {
    const C: Container = Container::Jws;

    // resolve the signature provider from the verification key
    let provider = SignatureProvider::from_curve(verifier.crv)?;

    // decompose the container
    let signature = b64::decode("signature", &jws.signature, C)?;
    let protected = b64::parse_protected(&jws.protected, C)?;

    // compose and validate the JOSE header
    let merged = header::merge(&[Some(&protected), jws.header.as_ref()], C)?;
    let critical =
        header::validate_crit(&protected, &merged, &DEFAULT_CRIT, options.crit.as_ref(), C)?;
    let b64 = resolve_b64(&protected, &critical)?;

    let Some(alg_name) = merged.get("alg").and_then(Value::as_str) else {
        return Err(C.invalid("`alg` is missing from the JOSE header"));
    };
    let Some(alg) = Algorithm::from_name(alg_name) else {
        return Err(Error::NotSupported(format!("unknown signing algorithm `{alg_name}`")));
    };
    if let Some(allowed) = &options.algorithms {
        if !allowed.contains(&alg) {
            return Err(Error::NotSupported(format!(
                "signing algorithm `{alg_name}` is not allowed"
            )));
        }
    }
    if alg != provider.algorithm() {
        return Err(C.invalid(format!(
            "`alg` {alg} does not match the verification key curve `{}`",
            verifier.crv
        )));
    }

    // rebuild the signing input, mirroring the signing side
    let (signing_input, payload) = if b64 {
        if detached.is_some() {
            return Err(C.invalid("a detached payload requires `b64: false`"));
        }
        let decoded = b64::decode("payload", &jws.payload, C)?;
        (format!("{}.{}", jws.protected, jws.payload).into_bytes(), decoded)
    } else {
        let Some(payload) = detached else {
            return Err(C.invalid("a `b64: false` JWS requires the payload to be provided detached"));
        };
        let mut input = format!("{}.", jws.protected).into_bytes();
        input.extend_from_slice(payload);
        (input, payload.to_vec())
    };

    if !provider.verify(verifier, &signing_input, &signature)? {
        return Err(Error::SignatureVerification);
    }

    Ok(Verified {
        payload,
        protected_header: protected,
        unprotected_header: jws.header.clone(),
    })
}
