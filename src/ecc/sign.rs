//! Digital signature providers.
//!
//! Each provider signs and verifies over raw message bytes for one curve and
//! exposes the canonical JWS algorithm for that curve. The ECDSA signatures
//! are the fixed-width `r || s` concatenation JOSE expects, not DER.

use ecdsa::signature::{Signer as _, Verifier as _};

use crate::error::{Container, Error};
use crate::jose::jwa::Algorithm;
use crate::jose::jwk::{Curve, Jwk};
use crate::Result;

/// Signature provider, keyed on the `crv` of the signing or verification
/// key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignatureProvider {
    /// ECDSA over NIST P-256 (ES256).
    Es256,

    /// ECDSA over NIST P-384 (ES384).
    Es384,

    /// ECDSA over NIST P-521 (ES512).
    Es512,

    /// ECDSA over secp256k1 (ES256K).
    Es256K,

    /// Ed25519 (EdDSA).
    EdDsa,
}

impl SignatureProvider {
    /// Resolve the provider for a curve.
    ///
    /// # Errors
    ///
    /// Returns an error if the curve does not support signing.
    pub fn from_curve(curve: Curve) -> Result<Self> {
        match curve {
            Curve::P256 => Ok(Self::Es256),
            Curve::P384 => Ok(Self::Es384),
            Curve::P521 => Ok(Self::Es512),
            Curve::Secp256k1 => Ok(Self::Es256K),
            Curve::Ed25519 => Ok(Self::EdDsa),
            Curve::X25519 => {
                Err(Error::NotSupported(format!("curve `{curve}` does not support signing")))
            }
        }
    }

    /// The canonical JWS algorithm for keys on the provider's curve.
    #[must_use]
    pub const fn algorithm(self) -> Algorithm {
        match self {
            Self::Es256 => Algorithm::ES256,
            Self::Es384 => Algorithm::ES384,
            Self::Es512 => Algorithm::ES512,
            Self::Es256K => Algorithm::ES256K,
            Self::EdDsa => Algorithm::EdDSA,
        }
    }

    /// Sign the message with the JWK's private key.
    ///
    /// # Errors
    ///
    /// Returns an error if the JWK has no private component or is not a
    /// valid key for the curve.
    pub fn sign(self, signer: &Jwk, message: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::Es256 => es256_sign(signer, message),
            Self::Es384 => es384_sign(signer, message),
            Self::Es512 => es512_sign(signer, message),
            Self::Es256K => es256k_sign(signer, message),
            Self::EdDsa => eddsa_sign(signer, message),
        }
    }

    /// Verify a signature over the message with the JWK's public key.
    /// Returns `Ok(false)` when the key is valid but the signature does not
    /// check out.
    ///
    /// # Errors
    ///
    /// Returns an error if the JWK is not a valid public key for the curve.
    pub fn verify(self, verifier: &Jwk, message: &[u8], signature: &[u8]) -> Result<bool> {
        match self {
            Self::Es256 => es256_verify(verifier, message, signature),
            Self::Es384 => es384_verify(verifier, message, signature),
            Self::Es512 => es512_verify(verifier, message, signature),
            Self::Es256K => es256k_verify(verifier, message, signature),
            Self::EdDsa => eddsa_verify(verifier, message, signature),
        }
    }
}

fn es256_sign(signer: &Jwk, message: &[u8]) -> Result<Vec<u8>> {
    let d = signer.decode_d(Container::Jws)?;
    let signing_key = p256::ecdsa::SigningKey::from_slice(&d)
        .map_err(|e| Error::JwsInvalid(format!("invalid signing key: {e}")))?;

    let signature: p256::ecdsa::Signature = signing_key
        .try_sign(message)
        .map_err(|e| Error::JwsInvalid(format!("issue signing: {e}")))?;
    Ok(signature.to_bytes().to_vec())
}

fn es256_verify(verifier: &Jwk, message: &[u8], signature: &[u8]) -> Result<bool> {
    let sec1 = verifier.sec1_uncompressed(Container::Jws)?;
    let verifying_key = p256::ecdsa::VerifyingKey::from_sec1_bytes(&sec1)
        .map_err(|e| Error::JwsInvalid(format!("invalid verification key: {e}")))?;

    let Ok(signature) = p256::ecdsa::Signature::from_slice(signature) else {
        return Ok(false);
    };
    Ok(verifying_key.verify(message, &signature).is_ok())
}

fn es384_sign(signer: &Jwk, message: &[u8]) -> Result<Vec<u8>> {
    let d = signer.decode_d(Container::Jws)?;
    let signing_key = p384::ecdsa::SigningKey::from_slice(&d)
        .map_err(|e| Error::JwsInvalid(format!("invalid signing key: {e}")))?;

    let signature: p384::ecdsa::Signature = signing_key
        .try_sign(message)
        .map_err(|e| Error::JwsInvalid(format!("issue signing: {e}")))?;
    Ok(signature.to_bytes().to_vec())
}

fn es384_verify(verifier: &Jwk, message: &[u8], signature: &[u8]) -> Result<bool> {
    let sec1 = verifier.sec1_uncompressed(Container::Jws)?;
    let verifying_key = p384::ecdsa::VerifyingKey::from_sec1_bytes(&sec1)
        .map_err(|e| Error::JwsInvalid(format!("invalid verification key: {e}")))?;

    let Ok(signature) = p384::ecdsa::Signature::from_slice(signature) else {
        return Ok(false);
    };
    Ok(verifying_key.verify(message, &signature).is_ok())
}

fn es512_sign(signer: &Jwk, message: &[u8]) -> Result<Vec<u8>> {
    let d = signer.decode_d(Container::Jws)?;
    let signing_key = p521::ecdsa::SigningKey::from_slice(&d)
        .map_err(|e| Error::JwsInvalid(format!("invalid signing key: {e}")))?;

    let signature: p521::ecdsa::Signature = signing_key
        .try_sign(message)
        .map_err(|e| Error::JwsInvalid(format!("issue signing: {e}")))?;
    Ok(signature.to_bytes().to_vec())
}

fn es512_verify(verifier: &Jwk, message: &[u8], signature: &[u8]) -> Result<bool> {
    let sec1 = verifier.sec1_uncompressed(Container::Jws)?;
    let verifying_key = p521::ecdsa::VerifyingKey::from_sec1_bytes(&sec1)
        .map_err(|e| Error::JwsInvalid(format!("invalid verification key: {e}")))?;

    let Ok(signature) = p521::ecdsa::Signature::from_slice(signature) else {
        return Ok(false);
    };
    Ok(verifying_key.verify(message, &signature).is_ok())
}

fn es256k_sign(signer: &Jwk, message: &[u8]) -> Result<Vec<u8>> {
    let d = signer.decode_d(Container::Jws)?;
    let signing_key = k256::ecdsa::SigningKey::from_slice(&d)
        .map_err(|e| Error::JwsInvalid(format!("invalid signing key: {e}")))?;

    let signature: k256::ecdsa::Signature = signing_key
        .try_sign(message)
        .map_err(|e| Error::JwsInvalid(format!("issue signing: {e}")))?;
    Ok(signature.to_bytes().to_vec())
}

fn es256k_verify(verifier: &Jwk, message: &[u8], signature: &[u8]) -> Result<bool> {
    let sec1 = verifier.sec1_uncompressed(Container::Jws)?;
    let verifying_key = k256::ecdsa::VerifyingKey::from_sec1_bytes(&sec1)
        .map_err(|e| Error::JwsInvalid(format!("invalid verification key: {e}")))?;

    let Ok(signature) = k256::ecdsa::Signature::from_slice(signature) else {
        return Ok(false);
    };
    // accept high-s signatures from other producers
    let normalized = signature.normalize_s().unwrap_or(signature);
    Ok(verifying_key.verify(message, &normalized).is_ok())
}

fn eddsa_sign(signer: &Jwk, message: &[u8]) -> Result<Vec<u8>> {
    let d = signer.decode_d(Container::Jws)?;
    let bytes: [u8; 32] = d
        .as_slice()
        .try_into()
        .map_err(|_| Error::JwsInvalid("invalid signing key length".into()))?;

    let signing_key = ed25519_dalek::SigningKey::from_bytes(&bytes);
    let signature: ed25519_dalek::Signature = signing_key
        .try_sign(message)
        .map_err(|e| Error::JwsInvalid(format!("issue signing: {e}")))?;
    Ok(signature.to_vec())
}

fn eddsa_verify(verifier: &Jwk, message: &[u8], signature: &[u8]) -> Result<bool> {
    let x = verifier.decode_x(Container::Jws)?;
    let bytes: [u8; 32] = x
        .as_slice()
        .try_into()
        .map_err(|_| Error::JwsInvalid("invalid verification key length".into()))?;
    let verifying_key = ed25519_dalek::VerifyingKey::from_bytes(&bytes)
        .map_err(|e| Error::JwsInvalid(format!("invalid verification key: {e}")))?;

    let Ok(signature) = ed25519_dalek::Signature::from_slice(signature) else {
        return Ok(false);
    };
    Ok(verifying_key.verify(message, &signature).is_ok())
}

#[cfg(test)]
mod test {
    use base64ct::{Base64UrlUnpadded as Base64, Encoding};
    use p256::elliptic_curve::sec1::ToEncodedPoint;
    use rand::rngs::OsRng;

    use super::*;
    use crate::jose::jwk::KeyType;

    fn p256_key() -> Jwk {
        let secret = p256::SecretKey::random(&mut OsRng);
        let point = secret.public_key().to_encoded_point(false);
        Jwk {
            kty: KeyType::Ec,
            crv: Curve::P256,
            x: Base64::encode_string(point.x().expect("should have x")),
            y: Some(Base64::encode_string(point.y().expect("should have y"))),
            d: Some(Base64::encode_string(&secret.to_bytes())),
            ..Jwk::default()
        }
    }

    fn ed25519_key() -> Jwk {
        let signing_key = ed25519_dalek::SigningKey::generate(&mut OsRng);
        Jwk {
            kty: KeyType::Okp,
            crv: Curve::Ed25519,
            x: Base64::encode_string(signing_key.verifying_key().as_bytes()),
            d: Some(Base64::encode_string(signing_key.as_bytes())),
            ..Jwk::default()
        }
    }

    #[test]
    fn sign_and_verify() {
        for key in [p256_key(), ed25519_key()] {
            let provider = SignatureProvider::from_curve(key.crv).expect("should resolve");
            let signature = provider.sign(&key, b"test data").expect("should sign");

            assert!(provider.verify(&key, b"test data", &signature).expect("should verify"));
            assert!(!provider.verify(&key, b"other data", &signature).expect("should verify"));
        }
    }

    #[test]
    fn malformed_signature_is_false() {
        let key = p256_key();
        let provider = SignatureProvider::from_curve(key.crv).expect("should resolve");
        assert!(!provider.verify(&key, b"test data", b"short").expect("should verify"));
    }

    #[test]
    fn signature_widths() {
        let key = p256_key();
        let signature = SignatureProvider::Es256.sign(&key, b"data").expect("should sign");
        assert_eq!(signature.len(), 64);

        let key = ed25519_key();
        let signature = SignatureProvider::EdDsa.sign(&key, b"data").expect("should sign");
        assert_eq!(signature.len(), 64);
    }

    #[test]
    fn x25519_cannot_sign() {
        assert!(SignatureProvider::from_curve(Curve::X25519).is_err());
    }

    #[test]
    fn canonical_algorithms() {
        assert_eq!(SignatureProvider::Es512.algorithm(), Algorithm::ES512);
        assert_eq!(SignatureProvider::EdDsa.algorithm(), Algorithm::EdDSA);
    }
}
