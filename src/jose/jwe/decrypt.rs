//! Flattened and compact JWE decryption.

use std::str::FromStr;

use serde_json::Value;

use super::{cek, Decrypted, DecryptOptions, Jwe};
use crate::aead;
use crate::ecc::ecdh::EcdhProvider;
use crate::error::{Container, Error};
use crate::jose::jwa::{CekAlgorithm, EncryptionAlgorithm};
use crate::jose::jwk::Jwk;
use crate::jose::{b64, header};
use crate::Result;

/// Decrypt a flattened JWE with the recipient's private key.
///
/// Once the container shape and headers have been validated, every
/// downstream failure — key derivation, ciphertext tampering, header
/// disagreement — surfaces as the same generic error after the RFC 7516
/// §11.5 timing mitigation has run, so callers cannot be used as a
/// decryption oracle.
///
/// # Errors
///
/// Returns an error if the container or headers are malformed, an algorithm
/// is unsupported or not allowed, or the JWE cannot be decrypted.
pub async fn decrypt(jwe: &Jwe, recipient: &Jwk, options: &DecryptOptions) -> Result<Decrypted> {
    const C: Container = Container::Jwe;

    // resolve the key agreement provider from the recipient key
    let provider = EcdhProvider::from_curve(recipient.crv)?;
    let recipient_private = provider.private_key_from_jwk(recipient)?;

    // decompose the container
    let iv = b64::decode("iv", &jwe.iv, C)?;
    let ciphertext = b64::decode("ciphertext", &jwe.ciphertext, C)?;
    let tag = b64::decode("tag", &jwe.tag, C)?;
    // decoded for shape validation only: direct agreement carries no key
    let _encrypted_key = b64::decode_optional("encrypted_key", jwe.encrypted_key.as_deref(), C)?;
    let aad = b64::decode_optional("aad", jwe.aad.as_deref(), C)?;
    let protected = b64::parse_protected(&jwe.protected, C)?;

    // compose and validate the JOSE header
    let merged =
        header::merge(&[Some(&protected), jwe.unprotected.as_ref(), jwe.header.as_ref()], C)?;
    if merged.contains_key("zip") {
        return Err(Error::NotSupported("the `zip` parameter is not supported".into()));
    }
    header::validate_crit(&protected, &merged, &[], options.crit.as_ref(), C)?;

    let Some(alg) = merged.get("alg").and_then(Value::as_str) else {
        return Err(C.invalid("`alg` is missing from the JOSE header"));
    };
    if let Some(allowed) = &options.key_management_algorithms {
        if !allowed.iter().any(|a| a == alg) {
            return Err(Error::NotSupported(format!(
                "key management algorithm `{alg}` is not allowed"
            )));
        }
    } else if alg.starts_with("PBES2") {
        // refused even though the registry never admits PBES2
        return Err(Error::NotSupported("PBES2 key management is not allowed".into()));
    }
    if alg != CekAlgorithm::EcdhEs.name() {
        return Err(Error::NotSupported(format!("unsupported key management algorithm `{alg}`")));
    }

    let Some(enc_name) = merged.get("enc").and_then(Value::as_str) else {
        return Err(C.invalid("`enc` is missing from the JOSE header"));
    };
    let Some(enc) = EncryptionAlgorithm::from_name(enc_name) else {
        return Err(Error::NotSupported(format!(
            "unknown content encryption algorithm `{enc_name}`"
        )));
    };
    if let Some(allowed) = &options.content_encryption_algorithms {
        if !allowed.iter().any(|a| a == enc_name) {
            return Err(Error::NotSupported(format!(
                "content encryption algorithm `{enc_name}` is not allowed"
            )));
        }
    }

    // derive the CEK behind the timing mitigation, rebuild the AAD exactly
    // as the encryption side constructed it, and decrypt
    let key = cek::decryption_key_mitigated(provider, &recipient_private, &merged, enc).await;
    let full_aad = match &jwe.aad {
        Some(aad) => format!("{}.{aad}", jwe.protected),
        None => jwe.protected.clone(),
    };
    let plaintext = aead::decrypt(enc, &ciphertext, &iv, &tag, &key, full_aad.as_bytes())
        .map_err(decrypt_failed)?;

    Ok(Decrypted {
        plaintext,
        protected_header: protected,
        shared_unprotected_header: jwe.unprotected.clone(),
        unprotected_header: jwe.header.clone(),
        additional_authenticated_data: aad,
    })
}

/// Decrypt a compact JWE with the recipient's private key.
///
/// # Errors
///
/// Returns an error if the input is not a five-segment compact JWE or the
/// contained JWE cannot be decrypted.
pub async fn decrypt_compact(
    compact_jwe: &str, recipient: &Jwk, options: &DecryptOptions,
) -> Result<Decrypted> {
    let jwe = Jwe::from_str(compact_jwe)?;
    decrypt(&jwe, recipient, options).await
}

// The single construction site for the uniform decryption failure: the
// inner cause is logged, never propagated.
fn decrypt_failed(e: Error) -> Error {
    tracing::debug!("decryption failed: {e}");
    Error::JweInvalid("failed to decrypt JWE".into())
}
