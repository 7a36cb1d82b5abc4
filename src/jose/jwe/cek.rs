//! Content encryption key derivation for ECDH-ES direct key agreement
//! (RFC 7518 §4.6).
//!
//! The decryption side is wrapped with the RFC 7516 §11.5 mitigation: when
//! the CEK cannot be derived, a random key of the correct size is substituted
//! after a randomized delay so the subsequent authentication failure is
//! indistinguishable — in timing and in error shape — from ciphertext
//! tampering.

use std::time::Duration;

use base64ct::{Base64UrlUnpadded as Base64, Encoding};
use rand::rngs::OsRng;
use rand::{Rng, RngCore};
use serde_json::{Map, Value};
use zeroize::Zeroizing;

use crate::ecc::ecdh::EcdhProvider;
use crate::error::Error;
use crate::jose::jwa::{CekAlgorithm, EncryptionAlgorithm};
use crate::jose::jwk::Jwk;
use crate::kdf::{self, MAX_PARTY_INFO};
use crate::Result;

/// A derived content encryption key and the header parameters that must
/// accompany it.
#[derive(Debug)]
pub(crate) struct EncryptionKey {
    /// The derived CEK. Wiped on drop.
    pub cek: Zeroizing<Vec<u8>>,

    /// Header parameters produced by the agreement: `epk`, plus `apu`/`apv`
    /// when party info was supplied.
    pub parameters: Map<String, Value>,
}

/// Derive the CEK on the encryption side: generate an ephemeral key on the
/// recipient's curve, agree, and run Concat KDF.
pub(crate) fn encryption_key(
    provider: EcdhProvider, recipient_public: &[u8], alg: &str, enc: EncryptionAlgorithm,
    apu: Option<&[u8]>, apv: Option<&[u8]>,
) -> Result<EncryptionKey> {
    if alg != CekAlgorithm::EcdhEs.name() {
        return Err(Error::NotSupported(format!("unsupported key management algorithm `{alg}`")));
    }

    let ephemeral = provider.generate_ephemeral()?;
    let z = provider.shared_secret(&ephemeral.secret, recipient_public)?;

    let (info, bits) = kdf::other_info(enc.name(), apu, apv)?;
    let cek = kdf::concat_kdf(&z, bits, &info)?;

    let mut parameters = Map::new();
    let epk = serde_json::to_value(&ephemeral.public_jwk)
        .map_err(|e| Error::JweInvalid(format!("issue serializing `epk`: {e}")))?;
    parameters.insert("epk".to_string(), epk);
    if let Some(apu) = apu {
        parameters.insert("apu".to_string(), Value::String(Base64::encode_string(apu)));
    }
    if let Some(apv) = apv {
        parameters.insert("apv".to_string(), Value::String(Base64::encode_string(apv)));
    }

    Ok(EncryptionKey {
        cek,
        parameters,
    })
}

/// Derive the CEK on the decryption side from the recipient's private key and
/// the `epk`, `apu`, and `apv` parameters of the JOSE header.
pub(crate) fn decryption_key(
    provider: EcdhProvider, recipient_private: &[u8], header: &Map<String, Value>,
    enc: EncryptionAlgorithm,
) -> Result<Zeroizing<Vec<u8>>> {
    let epk = validate_epk(provider, header)?;
    let apu = party_info(header, "apu")?;
    let apv = party_info(header, "apv")?;

    let z = provider.shared_secret(recipient_private, &epk)?;

    let (info, bits) = kdf::other_info(enc.name(), apu.as_deref(), apv.as_deref())?;
    kdf::concat_kdf(&z, bits, &info)
}

/// Derive the decryption CEK behind the RFC 7516 §11.5 mitigation. The
/// returned key is either the genuinely derived CEK or, after a uniform
/// random delay in [200, 500) ms, a random stand-in of the correct length.
/// The underlying derivation error is suppressed.
pub(crate) async fn decryption_key_mitigated(
    provider: EcdhProvider, recipient_private: &[u8], header: &Map<String, Value>,
    enc: EncryptionAlgorithm,
) -> Zeroizing<Vec<u8>> {
    match decryption_key(provider, recipient_private, header, enc) {
        Ok(cek) => cek,
        Err(e) => {
            tracing::debug!("substituting random CEK, key derivation failed: {e}");
            let delay = OsRng.gen_range(200..500);
            tokio::time::sleep(Duration::from_millis(delay)).await;

            let mut cek = Zeroizing::new(vec![0u8; enc.cek_len()]);
            OsRng.fill_bytes(&mut cek);
            cek
        }
    }
}

// Validate the ephemeral public key header parameter against the recipient
// curve and convert it to the raw encoding used for agreement.
fn validate_epk(provider: EcdhProvider, header: &Map<String, Value>) -> Result<Vec<u8>> {
    let Some(epk) = header.get("epk") else {
        return Err(Error::JweInvalid("`epk` is missing from the JOSE header".into()));
    };
    if !epk.is_object() {
        return Err(Error::JweInvalid("`epk` must be a JSON object".into()));
    }
    let jwk: Jwk = serde_json::from_value(epk.clone())
        .map_err(|e| Error::JweInvalid(format!("issue deserializing `epk`: {e}")))?;
    if jwk.crv != provider.curve() {
        return Err(Error::JweInvalid("`epk` curve does not match the recipient key".into()));
    }

    provider.public_key_from_jwk(&jwk)
}

// Decode an optional `apu`/`apv` header parameter.
fn party_info(header: &Map<String, Value>, name: &str) -> Result<Option<Vec<u8>>> {
    let Some(value) = header.get(name) else {
        return Ok(None);
    };
    let Some(encoded) = value.as_str() else {
        return Err(Error::JweInvalid(format!("`{name}` must be a base64url string")));
    };
    let decoded = Base64::decode_vec(encoded)
        .map_err(|e| Error::JweInvalid(format!("issue decoding `{name}`: {e}")))?;
    if decoded.len() > MAX_PARTY_INFO {
        return Err(Error::JweInvalid(format!("`{name}` must not exceed {MAX_PARTY_INFO} bytes")));
    }
    Ok(Some(decoded))
}
