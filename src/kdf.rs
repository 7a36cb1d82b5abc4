//! # Concat KDF
//!
//! The Concatenation Key Derivation Function (Approved Alternative 1) as
//! described in section 5.8.1 of NIST SP 800-56A, instantiated with SHA-256.
//! Used by ECDH-ES key agreement ([RFC7518 §4.6]) to derive the content
//! encryption key from the Diffie-Hellman shared secret.
//!
//! [RFC7518 §4.6]: https://www.rfc-editor.org/rfc/rfc7518#section-4.6

use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::error::Error;
use crate::jose::jwa::EncryptionAlgorithm;
use crate::Result;

/// Maximum length in bytes of the `PartyUInfo`/`PartyVInfo` agreement
/// values.
pub const MAX_PARTY_INFO: usize = 32;

/// Build the Concat KDF `OtherInfo` value ([RFC7518 §4.6.2]) for the named
/// content encryption algorithm, returning it alongside the algorithm's key
/// length in bits:
///
/// ```text
/// OtherInfo = len(AlgorithmID) || AlgorithmID
///          || len(PartyUInfo)  || PartyUInfo
///          || len(PartyVInfo)  || PartyVInfo
///          || SuppPubInfo (key length in bits, big-endian u32)
/// ```
///
/// Each length field is a big-endian 32-bit byte count. Absent party info is
/// treated as zero-length.
///
/// # Errors
///
/// Returns an error if `enc` is not a supported content encryption algorithm
/// or if either party info value exceeds [`MAX_PARTY_INFO`] bytes.
///
/// [RFC7518 §4.6.2]: https://www.rfc-editor.org/rfc/rfc7518#section-4.6.2
pub fn other_info(
    enc: &str, apu: Option<&[u8]>, apv: Option<&[u8]>,
) -> Result<(Vec<u8>, usize)> {
    let Some(algorithm) = EncryptionAlgorithm::from_name(enc) else {
        return Err(Error::NotSupported(format!(
            "unknown content encryption algorithm `{enc}`"
        )));
    };
    let apu = apu.unwrap_or_default();
    let apv = apv.unwrap_or_default();
    if apu.len() > MAX_PARTY_INFO {
        return Err(Error::JweInvalid(format!("`apu` must not exceed {MAX_PARTY_INFO} bytes")));
    }
    if apv.len() > MAX_PARTY_INFO {
        return Err(Error::JweInvalid(format!("`apv` must not exceed {MAX_PARTY_INFO} bytes")));
    }

    let alg_id = algorithm.name().as_bytes();
    let bits = algorithm.cek_bits();

    let mut info = Vec::with_capacity(16 + alg_id.len() + apu.len() + apv.len());
    info.extend((alg_id.len() as u32).to_be_bytes());
    info.extend(alg_id);
    info.extend((apu.len() as u32).to_be_bytes());
    info.extend(apu);
    info.extend((apv.len() as u32).to_be_bytes());
    info.extend(apv);
    info.extend((bits as u32).to_be_bytes());

    Ok((info, bits))
}

/// Derive `key_bits` of key material from the shared secret `z` and the
/// [`other_info`] context:
///
/// ```text
/// Hᵢ  = SHA-256(u32be(i) || Z || OtherInfo)   for i = 1..ceil(key_bits/256)
/// DKM = (H₁ || H₂ || …)[..key_bits / 8]
/// ```
///
/// # Errors
///
/// Returns an error if `key_bits` is not one of the supported content
/// encryption key lengths.
pub fn concat_kdf(z: &[u8], key_bits: usize, other_info: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    if !matches!(key_bits, 128 | 192 | 256 | 384 | 512) {
        return Err(Error::JweInvalid(format!("unsupported derived key length: {key_bits} bits")));
    }
    let key_len = key_bits >> 3;

    let rounds = key_len.div_ceil(Sha256::output_size());
    let mut derived = Zeroizing::new(Vec::with_capacity(rounds * Sha256::output_size()));
    for round in 1..=rounds {
        let mut hasher = Sha256::new();
        hasher.update((round as u32).to_be_bytes());
        hasher.update(z);
        hasher.update(other_info);
        derived.extend(hasher.finalize());
    }
    derived.truncate(key_len);

    Ok(derived)
}
