//! # JSON Web Key (JWK)
//!
//! A JWK ([RFC7517]) is a JSON representation of a cryptographic key.
//! Additionally, a JWK Set (JWKS) is used to represent a set of JWKs.
//!
//! See [RFC7517] for more detail.
//!
//! [RFC7517]: https://www.rfc-editor.org/rfc/rfc7517

use std::fmt::{self, Display};

use base64ct::{Base64UrlUnpadded as Base64, Encoding};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::Container;
use crate::Result;

/// JSON Web Key ([RFC7517]) for the elliptic-curve key types used by the JWE
/// and JWS operations. Carries the private scalar (`d`) when the key is a
/// private key.
///
/// [RFC7517]: https://www.rfc-editor.org/rfc/rfc7517
#[derive(Clone, Debug, Default, Deserialize, Serialize, Eq, PartialEq)]
pub struct Jwk {
    /// Key identifier.
    /// For example, "_Qq0UL2Fq651Q0Fjd6TvnYE-faHiOpRlPVQcY_-tA4A".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,

    /// Key type.
    pub kty: KeyType,

    /// Cryptographic curve type.
    pub crv: Curve,

    /// X coordinate, as a base64url string.
    pub x: String,

    /// Y coordinate, as a base64url string. Not used for `OKP` keys.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,

    /// Private scalar, as a base64url string. Only present on private keys.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d: Option<String>,

    /// Use of the key.
    #[serde(rename = "use")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_: Option<KeyUse>,
}

impl Jwk {
    /// The public half of this key, with the private scalar removed.
    #[must_use]
    pub fn public_key(&self) -> Self {
        Self {
            d: None,
            ..self.clone()
        }
    }

    // Decode the `x` coordinate, checking its length against the curve.
    pub(crate) fn decode_x(&self, c: Container) -> Result<Vec<u8>> {
        decode_scalar("x", &self.x, self.crv, c)
    }

    // Decode the `y` coordinate. Required for EC keys.
    pub(crate) fn decode_y(&self, c: Container) -> Result<Vec<u8>> {
        let Some(y) = &self.y else {
            return Err(c.invalid("JWK `y` is missing"));
        };
        decode_scalar("y", y, self.crv, c)
    }

    // Decode the private scalar `d`.
    pub(crate) fn decode_d(&self, c: Container) -> Result<Zeroizing<Vec<u8>>> {
        let Some(d) = &self.d else {
            return Err(c.invalid("JWK has no private component `d`"));
        };
        decode_scalar("d", d, self.crv, c).map(Zeroizing::new)
    }

    // The uncompressed SEC1 point (0x04 || x || y) for an EC key.
    pub(crate) fn sec1_uncompressed(&self, c: Container) -> Result<Vec<u8>> {
        let mut sec1 = vec![0x04];
        sec1.extend(self.decode_x(c)?);
        sec1.extend(self.decode_y(c)?);
        Ok(sec1)
    }
}

fn decode_scalar(field: &str, value: &str, crv: Curve, c: Container) -> Result<Vec<u8>> {
    let bytes = Base64::decode_vec(value)
        .map_err(|e| c.invalid(format!("issue decoding JWK `{field}`: {e}")))?;
    if bytes.len() != crv.scalar_len() {
        return Err(c.invalid(format!("JWK `{field}` length does not match curve `{crv}`")));
    }
    Ok(bytes)
}

/// Cryptographic key type.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, Eq, PartialEq)]
pub enum KeyType {
    /// Octet key pair (Edwards and Montgomery curves).
    #[default]
    #[serde(rename = "OKP")]
    Okp,

    /// Elliptic curve key pair.
    #[serde(rename = "EC")]
    Ec,
}

/// Cryptographic curve type.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, Eq, PartialEq)]
pub enum Curve {
    /// NIST P-256 curve.
    #[serde(rename = "P-256")]
    P256,

    /// NIST P-384 curve.
    #[serde(rename = "P-384")]
    P384,

    /// NIST P-521 curve.
    #[serde(rename = "P-521")]
    P521,

    /// secp256k1 curve.
    #[serde(rename = "secp256k1")]
    Secp256k1,

    /// Ed25519 curve.
    #[default]
    Ed25519,

    /// X25519 curve.
    X25519,
}

impl Curve {
    /// The IANA-registered curve name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::P256 => "P-256",
            Self::P384 => "P-384",
            Self::P521 => "P-521",
            Self::Secp256k1 => "secp256k1",
            Self::Ed25519 => "Ed25519",
            Self::X25519 => "X25519",
        }
    }

    /// Length in bytes of a scalar (and of each point coordinate) on the
    /// curve.
    #[must_use]
    pub const fn scalar_len(self) -> usize {
        match self {
            Self::P256 | Self::Secp256k1 | Self::Ed25519 | Self::X25519 => 32,
            Self::P384 => 48,
            Self::P521 => 66,
        }
    }

    /// The JWK key type for keys on the curve.
    #[must_use]
    pub const fn key_type(self) -> KeyType {
        match self {
            Self::P256 | Self::P384 | Self::P521 | Self::Secp256k1 => KeyType::Ec,
            Self::Ed25519 | Self::X25519 => KeyType::Okp,
        }
    }
}

impl Display for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The intended usage of the public `KeyType`.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum KeyUse {
    /// Public key is to be used for signature verification.
    #[default]
    #[serde(rename = "sig")]
    Signature,

    /// Public key is to be used for encryption.
    #[serde(rename = "enc")]
    Encryption,
}

/// A set of JWKs.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Jwks {
    /// The set of public key JWKs.
    pub keys: Vec<Jwk>,
}
