//! Elliptic Curve Diffie-Hellman key agreement providers.
//!
//! Each provider generates ephemeral keys, converts between JWK and raw key
//! encodings, and computes the ECDH shared secret `Z` for its curve. For the
//! NIST P-curves `Z` is the x-coordinate of the agreed point; for X25519 it
//! is the raw shared secret.

use base64ct::{Base64UrlUnpadded as Base64, Encoding};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use rand::rngs::OsRng;
use zeroize::Zeroizing;

use crate::error::{Container, Error};
use crate::jose::jwk::{Curve, Jwk, KeyType};
use crate::Result;

/// Key agreement provider, keyed on the `crv` of the recipient key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EcdhProvider {
    /// NIST P-256.
    P256,

    /// NIST P-384.
    P384,

    /// NIST P-521.
    P521,

    /// X25519.
    X25519,
}

/// An ephemeral key pair: the raw private scalar and the public half as a
/// JWK, ready to travel as the `epk` header parameter.
pub struct EphemeralKey {
    /// Raw private scalar. Wiped on drop.
    pub secret: Zeroizing<Vec<u8>>,

    /// Public key JWK (`epk`).
    pub public_jwk: Jwk,
}

impl EcdhProvider {
    /// Resolve the provider for a curve.
    ///
    /// # Errors
    ///
    /// Returns an error if the curve does not support ECDH key agreement.
    pub fn from_curve(curve: Curve) -> Result<Self> {
        match curve {
            Curve::P256 => Ok(Self::P256),
            Curve::P384 => Ok(Self::P384),
            Curve::P521 => Ok(Self::P521),
            Curve::X25519 => Ok(Self::X25519),
            Curve::Secp256k1 | Curve::Ed25519 => Err(Error::NotSupported(format!(
                "curve `{curve}` does not support ECDH key agreement"
            ))),
        }
    }

    /// The provider's curve.
    #[must_use]
    pub const fn curve(self) -> Curve {
        match self {
            Self::P256 => Curve::P256,
            Self::P384 => Curve::P384,
            Self::P521 => Curve::P521,
            Self::X25519 => Curve::X25519,
        }
    }

    /// Generate an ephemeral key pair on the provider's curve.
    ///
    /// # Errors
    ///
    /// Returns an error if key generation fails.
    pub fn generate_ephemeral(self) -> Result<EphemeralKey> {
        match self {
            Self::P256 => p256_ephemeral(),
            Self::P384 => p384_ephemeral(),
            Self::P521 => p521_ephemeral(),
            Self::X25519 => Ok(x25519_ephemeral()),
        }
    }

    /// Compute the ECDH shared secret from a raw private scalar and a raw
    /// public key (SEC1 uncompressed for the P-curves, 32 bytes for X25519).
    ///
    /// # Errors
    ///
    /// Returns an error if either key is not valid for the curve.
    pub fn shared_secret(
        self, private_key: &[u8], public_key: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>> {
        match self {
            Self::P256 => p256_shared_secret(private_key, public_key),
            Self::P384 => p384_shared_secret(private_key, public_key),
            Self::P521 => p521_shared_secret(private_key, public_key),
            Self::X25519 => x25519_shared_secret(private_key, public_key),
        }
    }

    /// Convert a JWK to the raw public key encoding used by
    /// [`Self::shared_secret`], validating key type, coordinate lengths, and
    /// curve membership.
    ///
    /// # Errors
    ///
    /// Returns an error if the JWK is not a valid public key for the curve.
    pub fn public_key_from_jwk(self, jwk: &Jwk) -> Result<Vec<u8>> {
        const C: Container = Container::Jwe;

        if jwk.kty != self.curve().key_type() {
            return Err(C.invalid(format!("JWK `kty` does not match curve `{}`", self.curve())));
        }
        match self {
            Self::P256 => {
                let sec1 = jwk.sec1_uncompressed(C)?;
                p256::PublicKey::from_sec1_bytes(&sec1)
                    .map_err(|e| C.invalid(format!("invalid public key: {e}")))?;
                Ok(sec1)
            }
            Self::P384 => {
                let sec1 = jwk.sec1_uncompressed(C)?;
                p384::PublicKey::from_sec1_bytes(&sec1)
                    .map_err(|e| C.invalid(format!("invalid public key: {e}")))?;
                Ok(sec1)
            }
            Self::P521 => {
                let sec1 = jwk.sec1_uncompressed(C)?;
                p521::PublicKey::from_sec1_bytes(&sec1)
                    .map_err(|e| C.invalid(format!("invalid public key: {e}")))?;
                Ok(sec1)
            }
            Self::X25519 => {
                if jwk.y.is_some() {
                    return Err(C.invalid("JWK `y` must be absent for OKP keys"));
                }
                jwk.decode_x(C)
            }
        }
    }

    /// Convert a JWK to the raw private scalar used by
    /// [`Self::shared_secret`].
    ///
    /// # Errors
    ///
    /// Returns an error if the JWK has no private component or the scalar
    /// length does not match the curve.
    pub fn private_key_from_jwk(self, jwk: &Jwk) -> Result<Zeroizing<Vec<u8>>> {
        const C: Container = Container::Jwe;

        if jwk.kty != self.curve().key_type() {
            return Err(C.invalid(format!("JWK `kty` does not match curve `{}`", self.curve())));
        }
        jwk.decode_d(C)
    }
}

fn point_jwk(curve: Curve, x: Option<&[u8]>, y: Option<&[u8]>) -> Result<Jwk> {
    let (Some(x), Some(y)) = (x, y) else {
        return Err(Error::JweInvalid("issue encoding ephemeral public key".into()));
    };
    Ok(Jwk {
        kty: KeyType::Ec,
        crv: curve,
        x: Base64::encode_string(x),
        y: Some(Base64::encode_string(y)),
        ..Jwk::default()
    })
}

fn p256_ephemeral() -> Result<EphemeralKey> {
    let secret = p256::SecretKey::random(&mut OsRng);
    let point = secret.public_key().to_encoded_point(false);
    Ok(EphemeralKey {
        secret: Zeroizing::new(secret.to_bytes().to_vec()),
        public_jwk: point_jwk(
            Curve::P256,
            point.x().map(|x| x.as_slice()),
            point.y().map(|y| y.as_slice()),
        )?,
    })
}

fn p384_ephemeral() -> Result<EphemeralKey> {
    let secret = p384::SecretKey::random(&mut OsRng);
    let point = secret.public_key().to_encoded_point(false);
    Ok(EphemeralKey {
        secret: Zeroizing::new(secret.to_bytes().to_vec()),
        public_jwk: point_jwk(
            Curve::P384,
            point.x().map(|x| x.as_slice()),
            point.y().map(|y| y.as_slice()),
        )?,
    })
}

fn p521_ephemeral() -> Result<EphemeralKey> {
    let secret = p521::SecretKey::random(&mut OsRng);
    let point = secret.public_key().to_encoded_point(false);
    Ok(EphemeralKey {
        secret: Zeroizing::new(secret.to_bytes().to_vec()),
        public_jwk: point_jwk(
            Curve::P521,
            point.x().map(|x| x.as_slice()),
            point.y().map(|y| y.as_slice()),
        )?,
    })
}

fn x25519_ephemeral() -> EphemeralKey {
    let secret = x25519_dalek::StaticSecret::random_from_rng(OsRng);
    let public = x25519_dalek::PublicKey::from(&secret);

    EphemeralKey {
        secret: Zeroizing::new(secret.to_bytes().to_vec()),
        public_jwk: Jwk {
            kty: KeyType::Okp,
            crv: Curve::X25519,
            x: Base64::encode_string(public.as_bytes()),
            ..Jwk::default()
        },
    }
}

fn p256_shared_secret(private_key: &[u8], public_key: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    let secret = p256::SecretKey::from_slice(private_key)
        .map_err(|e| Error::JweInvalid(format!("invalid private key scalar: {e}")))?;
    let public = p256::PublicKey::from_sec1_bytes(public_key)
        .map_err(|e| Error::JweInvalid(format!("invalid public key: {e}")))?;

    let shared = p256::ecdh::diffie_hellman(secret.to_nonzero_scalar(), public.as_affine());
    Ok(Zeroizing::new(shared.raw_secret_bytes().to_vec()))
}

fn p384_shared_secret(private_key: &[u8], public_key: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    let secret = p384::SecretKey::from_slice(private_key)
        .map_err(|e| Error::JweInvalid(format!("invalid private key scalar: {e}")))?;
    let public = p384::PublicKey::from_sec1_bytes(public_key)
        .map_err(|e| Error::JweInvalid(format!("invalid public key: {e}")))?;

    let shared = p384::ecdh::diffie_hellman(secret.to_nonzero_scalar(), public.as_affine());
    Ok(Zeroizing::new(shared.raw_secret_bytes().to_vec()))
}

fn p521_shared_secret(private_key: &[u8], public_key: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    let secret = p521::SecretKey::from_slice(private_key)
        .map_err(|e| Error::JweInvalid(format!("invalid private key scalar: {e}")))?;
    let public = p521::PublicKey::from_sec1_bytes(public_key)
        .map_err(|e| Error::JweInvalid(format!("invalid public key: {e}")))?;

    let shared = p521::ecdh::diffie_hellman(secret.to_nonzero_scalar(), public.as_affine());
    Ok(Zeroizing::new(shared.raw_secret_bytes().to_vec()))
}

fn x25519_shared_secret(private_key: &[u8], public_key: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    let private: [u8; 32] = private_key
        .try_into()
        .map_err(|_| Error::JweInvalid("invalid private key length".into()))?;
    let public: [u8; 32] = public_key
        .try_into()
        .map_err(|_| Error::JweInvalid("invalid public key length".into()))?;

    let secret = x25519_dalek::StaticSecret::from(private);
    let shared = secret.diffie_hellman(&x25519_dalek::PublicKey::from(public));
    Ok(Zeroizing::new(shared.as_bytes().to_vec()))
}
