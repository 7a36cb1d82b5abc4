//! Authenticated encryption for the JWE content encryption algorithms.
//!
//! Implements the six supported `enc` values: AES-GCM ([RFC7518 §5.3]) with
//! a 96-bit IV and 128-bit tag, and the AES-CBC + HMAC composites
//! ([RFC7518 §5.2]), which split the CEK into a MAC half and an encryption
//! half and truncate the HMAC to half the key length.
//!
//! [RFC7518 §5.2]: https://www.rfc-editor.org/rfc/rfc7518#section-5.2
//! [RFC7518 §5.3]: https://www.rfc-editor.org/rfc/rfc7518#section-5.3

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes::{Aes128, Aes192, Aes256};
use aes_gcm::aead::consts::{U12, U16};
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{AeadCore, AeadInPlace, KeyInit};
use aes_gcm::{Aes128Gcm, Aes256Gcm, AesGcm, Key};
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Sha256, Sha384, Sha512};

use crate::error::Error;
use crate::jose::jwa::EncryptionAlgorithm;
use crate::Result;

type Aes192Gcm = AesGcm<Aes192, U12>;

/// The output of an authenticated encryption: ciphertext with the IV and
/// tag detached.
pub struct Sealed {
    /// Ciphertext.
    pub ciphertext: Vec<u8>,

    /// Initialization vector (nonce).
    pub iv: Vec<u8>,

    /// Authentication tag.
    pub tag: Vec<u8>,
}

/// Encrypt the plaintext, binding the additional authenticated data. A fresh
/// IV of the algorithm's standard size is generated for each invocation.
///
/// # Errors
///
/// Returns an error if the CEK length does not match the algorithm or the
/// underlying cipher fails.
pub fn encrypt(
    enc: EncryptionAlgorithm, plaintext: &[u8], cek: &[u8], aad: &[u8],
) -> Result<Sealed> {
    if cek.len() != enc.cek_len() {
        return Err(Error::JweInvalid(format!("invalid content encryption key length for {enc}")));
    }

    match enc {
        EncryptionAlgorithm::A128Gcm => gcm_encrypt::<Aes128Gcm>(plaintext, cek, aad),
        EncryptionAlgorithm::A192Gcm => gcm_encrypt::<Aes192Gcm>(plaintext, cek, aad),
        EncryptionAlgorithm::A256Gcm => gcm_encrypt::<Aes256Gcm>(plaintext, cek, aad),
        EncryptionAlgorithm::A128CbcHs256 => {
            cbc_hs_encrypt::<cbc::Encryptor<Aes128>, Hmac<Sha256>>(plaintext, cek, aad)
        }
        EncryptionAlgorithm::A192CbcHs384 => {
            cbc_hs_encrypt::<cbc::Encryptor<Aes192>, Hmac<Sha384>>(plaintext, cek, aad)
        }
        EncryptionAlgorithm::A256CbcHs512 => {
            cbc_hs_encrypt::<cbc::Encryptor<Aes256>, Hmac<Sha512>>(plaintext, cek, aad)
        }
    }
}

/// Decrypt the ciphertext, authenticating the additional data and tag.
///
/// # Errors
///
/// Returns an error if the key, IV, or tag length does not match the
/// algorithm, or if authentication or decryption fails.
pub fn decrypt(
    enc: EncryptionAlgorithm, ciphertext: &[u8], iv: &[u8], tag: &[u8], cek: &[u8], aad: &[u8],
) -> Result<Vec<u8>> {
    if cek.len() != enc.cek_len() {
        return Err(Error::JweInvalid(format!("invalid content encryption key length for {enc}")));
    }
    if iv.len() != enc.iv_len() {
        return Err(Error::JweInvalid(format!("invalid initialization vector length for {enc}")));
    }
    if tag.len() != enc.tag_len() {
        return Err(Error::JweInvalid(format!("invalid authentication tag length for {enc}")));
    }

    match enc {
        EncryptionAlgorithm::A128Gcm => gcm_decrypt::<Aes128Gcm>(ciphertext, iv, tag, cek, aad),
        EncryptionAlgorithm::A192Gcm => gcm_decrypt::<Aes192Gcm>(ciphertext, iv, tag, cek, aad),
        EncryptionAlgorithm::A256Gcm => gcm_decrypt::<Aes256Gcm>(ciphertext, iv, tag, cek, aad),
        EncryptionAlgorithm::A128CbcHs256 => {
            cbc_hs_decrypt::<cbc::Decryptor<Aes128>, Hmac<Sha256>>(ciphertext, iv, tag, cek, aad)
        }
        EncryptionAlgorithm::A192CbcHs384 => {
            cbc_hs_decrypt::<cbc::Decryptor<Aes192>, Hmac<Sha384>>(ciphertext, iv, tag, cek, aad)
        }
        EncryptionAlgorithm::A256CbcHs512 => {
            cbc_hs_decrypt::<cbc::Decryptor<Aes256>, Hmac<Sha512>>(ciphertext, iv, tag, cek, aad)
        }
    }
}

fn gcm_encrypt<A>(plaintext: &[u8], cek: &[u8], aad: &[u8]) -> Result<Sealed>
where
    A: AeadInPlace + KeyInit + AeadCore<NonceSize = U12, TagSize = U16>,
{
    let mut iv = vec![0u8; 12];
    OsRng.fill_bytes(&mut iv);

    let mut buffer = plaintext.to_vec();
    let tag = A::new(Key::<A>::from_slice(cek))
        .encrypt_in_place_detached(GenericArray::from_slice(&iv), aad, &mut buffer)
        .map_err(|e| Error::JweInvalid(format!("issue encrypting: {e}")))?;

    Ok(Sealed {
        ciphertext: buffer,
        iv,
        tag: tag.to_vec(),
    })
}

fn gcm_decrypt<A>(ciphertext: &[u8], iv: &[u8], tag: &[u8], cek: &[u8], aad: &[u8]) -> Result<Vec<u8>>
where
    A: AeadInPlace + KeyInit + AeadCore<NonceSize = U12, TagSize = U16>,
{
    let mut buffer = ciphertext.to_vec();
    A::new(Key::<A>::from_slice(cek))
        .decrypt_in_place_detached(
            GenericArray::from_slice(iv),
            aad,
            &mut buffer,
            GenericArray::from_slice(tag),
        )
        .map_err(|e| Error::JweInvalid(format!("issue decrypting: {e}")))?;

    Ok(buffer)
}

fn cbc_hs_encrypt<C, M>(plaintext: &[u8], cek: &[u8], aad: &[u8]) -> Result<Sealed>
where
    C: BlockEncryptMut + KeyIvInit,
    M: Mac + KeyInit,
{
    let (mac_key, enc_key) = cek.split_at(cek.len() / 2);

    let mut iv = vec![0u8; 16];
    OsRng.fill_bytes(&mut iv);

    let ciphertext = C::new_from_slices(enc_key, &iv)
        .map_err(|e| Error::JweInvalid(format!("issue initializing cipher: {e}")))?
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext);
    let tag = cbc_hs_mac::<M>(mac_key, aad, &iv, &ciphertext)?.finalize().into_bytes()
        [..mac_key.len()]
        .to_vec();

    Ok(Sealed {
        ciphertext,
        iv,
        tag,
    })
}

fn cbc_hs_decrypt<C, M>(
    ciphertext: &[u8], iv: &[u8], tag: &[u8], cek: &[u8], aad: &[u8],
) -> Result<Vec<u8>>
where
    C: BlockDecryptMut + KeyIvInit,
    M: Mac + KeyInit,
{
    let (mac_key, enc_key) = cek.split_at(cek.len() / 2);

    // authenticate before any decryption work
    cbc_hs_mac::<M>(mac_key, aad, iv, ciphertext)?
        .verify_truncated_left(tag)
        .map_err(|_| Error::JweInvalid("authentication tag mismatch".into()))?;

    C::new_from_slices(enc_key, iv)
        .map_err(|e| Error::JweInvalid(format!("issue initializing cipher: {e}")))?
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| Error::JweInvalid("issue decrypting: invalid padding".into()))
}

// HMAC over AAD || IV || ciphertext || AL, where AL is the AAD length in
// bits as a big-endian u64 (RFC 7518 §5.2.2.1).
fn cbc_hs_mac<M: Mac + KeyInit>(
    mac_key: &[u8], aad: &[u8], iv: &[u8], ciphertext: &[u8],
) -> Result<M> {
    let mut mac = <M as Mac>::new_from_slice(mac_key)
        .map_err(|e| Error::JweInvalid(format!("issue initializing MAC: {e}")))?;
    mac.update(aad);
    mac.update(iv);
    mac.update(ciphertext);
    mac.update(&(8 * aad.len() as u64).to_be_bytes());
    Ok(mac)
}
