//! # JSON Web Algorithms (JWA)
//!
//! JWA ([RFC7518]) defines a set of cryptographic algorithms for use with
//! JWS ([RFC7515]), JWE ([RFC7516]), and JWK ([RFC7517]).
//!
//! See associated [IANA] registries for more information.
//!
//! [RFC7515]: https://www.rfc-editor.org/rfc/rfc7515
//! [RFC7516]: https://www.rfc-editor.org/rfc/rfc7516
//! [RFC7517]: https://www.rfc-editor.org/rfc/rfc7517
//! [RFC7518]: https://www.rfc-editor.org/rfc/rfc7518
//! [IANA]: https://www.iana.org/assignments/jose/jose.xhtml

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// Digital signature algorithms used to secure a JWS.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum Algorithm {
    /// ECDSA using P-256 and SHA-256.
    #[serde(rename = "ES256")]
    ES256,

    /// ECDSA using P-384 and SHA-384.
    #[serde(rename = "ES384")]
    ES384,

    /// ECDSA using P-521 and SHA-512.
    #[serde(rename = "ES512")]
    ES512,

    /// ECDSA using secp256k1 and SHA-256.
    #[serde(rename = "ES256K")]
    ES256K,

    /// EdDSA using Ed25519.
    #[default]
    #[serde(rename = "EdDSA")]
    EdDSA,
}

impl Algorithm {
    /// The IANA-registered algorithm name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ES256 => "ES256",
            Self::ES384 => "ES384",
            Self::ES512 => "ES512",
            Self::ES256K => "ES256K",
            Self::EdDSA => "EdDSA",
        }
    }

    /// Look up an algorithm by its IANA-registered name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ES256" => Some(Self::ES256),
            "ES384" => Some(Self::ES384),
            "ES512" => Some(Self::ES512),
            "ES256K" => Some(Self::ES256K),
            "EdDSA" => Some(Self::EdDSA),
            _ => None,
        }
    }
}

impl Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The algorithm used to encrypt or determine the value of the content
/// encryption key (CEK).
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum CekAlgorithm {
    /// Elliptic Curve Diffie-Hellman Ephemeral-Static key agreement
    /// (using Concat KDF). The agreed key is used directly as the CEK.
    #[default]
    #[serde(rename = "ECDH-ES")]
    EcdhEs,
}

impl CekAlgorithm {
    /// The IANA-registered algorithm name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::EcdhEs => "ECDH-ES",
        }
    }
}

impl Display for CekAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The algorithm used to perform authenticated encryption on the plaintext to
/// produce the ciphertext and the Authentication Tag. MUST be an AEAD
/// algorithm.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum EncryptionAlgorithm {
    /// AES in Galois/Counter Mode (GCM) using a 128-bit key.
    #[serde(rename = "A128GCM")]
    A128Gcm,

    /// AES GCM using a 192-bit key.
    #[serde(rename = "A192GCM")]
    A192Gcm,

    /// AES GCM using a 256-bit key.
    #[default]
    #[serde(rename = "A256GCM")]
    A256Gcm,

    /// AES-128 in CBC mode composed with HMAC SHA-256.
    #[serde(rename = "A128CBC-HS256")]
    A128CbcHs256,

    /// AES-192 in CBC mode composed with HMAC SHA-384.
    #[serde(rename = "A192CBC-HS384")]
    A192CbcHs384,

    /// AES-256 in CBC mode composed with HMAC SHA-512.
    #[serde(rename = "A256CBC-HS512")]
    A256CbcHs512,
}

impl EncryptionAlgorithm {
    /// The IANA-registered algorithm name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::A128Gcm => "A128GCM",
            Self::A192Gcm => "A192GCM",
            Self::A256Gcm => "A256GCM",
            Self::A128CbcHs256 => "A128CBC-HS256",
            Self::A192CbcHs384 => "A192CBC-HS384",
            Self::A256CbcHs512 => "A256CBC-HS512",
        }
    }

    /// Look up an algorithm by its IANA-registered name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "A128GCM" => Some(Self::A128Gcm),
            "A192GCM" => Some(Self::A192Gcm),
            "A256GCM" => Some(Self::A256Gcm),
            "A128CBC-HS256" => Some(Self::A128CbcHs256),
            "A192CBC-HS384" => Some(Self::A192CbcHs384),
            "A256CBC-HS512" => Some(Self::A256CbcHs512),
            _ => None,
        }
    }

    /// Content encryption key length in bits. The CBC-HMAC composites use
    /// half the key for encryption and half for the MAC, so their CEKs are
    /// twice the AES key size.
    #[must_use]
    pub const fn cek_bits(self) -> usize {
        match self {
            Self::A128Gcm => 128,
            Self::A192Gcm => 192,
            Self::A256Gcm | Self::A128CbcHs256 => 256,
            Self::A192CbcHs384 => 384,
            Self::A256CbcHs512 => 512,
        }
    }

    /// Content encryption key length in bytes.
    #[must_use]
    pub const fn cek_len(self) -> usize {
        self.cek_bits() >> 3
    }

    /// Initialization vector length in bytes: 96 bits for GCM, 128 bits for
    /// the CBC-HMAC composites.
    #[must_use]
    pub const fn iv_len(self) -> usize {
        match self {
            Self::A128Gcm | Self::A192Gcm | Self::A256Gcm => 12,
            Self::A128CbcHs256 | Self::A192CbcHs384 | Self::A256CbcHs512 => 16,
        }
    }

    /// Authentication tag length in bytes: 128 bits for GCM, half the CEK
    /// for the CBC-HMAC composites.
    #[must_use]
    pub const fn tag_len(self) -> usize {
        match self {
            Self::A128Gcm | Self::A192Gcm | Self::A256Gcm => 16,
            Self::A128CbcHs256 => 16,
            Self::A192CbcHs384 => 24,
            Self::A256CbcHs512 => 32,
        }
    }
}

impl Display for EncryptionAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn registered_names() {
        assert_eq!(Algorithm::ES256K.to_string(), "ES256K");
        assert_eq!(Algorithm::from_name("EdDSA"), Some(Algorithm::EdDSA));
        assert_eq!(Algorithm::from_name("RS256"), None);

        assert_eq!(CekAlgorithm::EcdhEs.name(), "ECDH-ES");

        assert_eq!(EncryptionAlgorithm::A128CbcHs256.name(), "A128CBC-HS256");
        assert_eq!(
            EncryptionAlgorithm::from_name("A256GCM"),
            Some(EncryptionAlgorithm::A256Gcm)
        );
        assert_eq!(EncryptionAlgorithm::from_name("A256CBC"), None);
    }

    #[test]
    fn serde_round_trip() {
        let json = serde_json::to_string(&EncryptionAlgorithm::A192CbcHs384).expect("should serialize");
        assert_eq!(json, "\"A192CBC-HS384\"");
        let enc: EncryptionAlgorithm = serde_json::from_str(&json).expect("should deserialize");
        assert_eq!(enc, EncryptionAlgorithm::A192CbcHs384);
    }

    #[test]
    fn cek_lengths() {
        assert_eq!(EncryptionAlgorithm::A128Gcm.cek_len(), 16);
        assert_eq!(EncryptionAlgorithm::A192Gcm.cek_len(), 24);
        assert_eq!(EncryptionAlgorithm::A256Gcm.cek_len(), 32);
        assert_eq!(EncryptionAlgorithm::A128CbcHs256.cek_len(), 32);
        assert_eq!(EncryptionAlgorithm::A192CbcHs384.cek_len(), 48);
        assert_eq!(EncryptionAlgorithm::A256CbcHs512.cek_len(), 64);
    }
}
