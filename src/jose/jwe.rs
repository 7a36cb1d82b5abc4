//! # JSON Web Encryption (JWE)
//!
//! JWE ([RFC7516]) specifies how encrypted content can be represented using
//! JSON. See JWA ([RFC7518]) for more on the cryptographic algorithms and
//! identifiers used.
//!
//! Key management is ECDH-ES direct key agreement: the content encryption
//! key is derived from the Diffie-Hellman shared secret with Concat KDF and
//! the sender's ephemeral public key travels in the `epk` header parameter.
//! No encrypted key is carried.
//!
//! See also:
//!
//! - <https://www.iana.org/assignments/jose/jose.xhtml#web-signature-encryption-algorithms>
//! - CFRG Elliptic Curve Diffie-Hellman (ECDH) and Signatures in JOSE ([ECDH])
//!
//! [RFC7516]: https://www.rfc-editor.org/rfc/rfc7516
//! [RFC7518]: https://www.rfc-editor.org/rfc/rfc7518
//! [ECDH]: https://tools.ietf.org/html/rfc8037

mod cek;
mod decrypt;
mod encrypt;

use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use self::decrypt::{decrypt, decrypt_compact};
pub use self::encrypt::{JweBuilder, KeyManagementParams};
use crate::error::Error;
use crate::Result;

/// A JWE in the flattened JSON serialization ([RFC7516 §7.2.2]).
///
/// In JWE JSON serialization, one or more of the JWE Protected Header, JWE
/// Shared Unprotected Header, and JWE Per-Recipient Unprotected Header MUST
/// be present. In this case, the members of the JOSE Header are the union of
/// the members of the header values that are present.
///
/// [RFC7516 §7.2.2]: https://www.rfc-editor.org/rfc/rfc7516#section-7.2.2
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Jwe {
    /// JWE protected header, as a base64url encoded string.
    pub protected: String,

    /// Encrypted key, as a base64url encoded string. Absent for ECDH-ES
    /// direct key agreement.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encrypted_key: Option<String>,

    /// Initialization vector (nonce), as a base64url encoded string.
    pub iv: String,

    /// Ciphertext, as a base64url encoded string.
    pub ciphertext: String,

    /// Authentication tag resulting from the encryption, as a base64url
    /// encoded string.
    pub tag: String,

    /// Additional authenticated data, base64url encoded. Not representable
    /// in the compact serialization.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aad: Option<String>,

    /// Shared unprotected header as a JSON object.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unprotected: Option<Map<String, Value>>,

    /// Per-recipient unprotected header as a JSON object.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<Map<String, Value>>,
}

impl Jwe {
    /// Project the JWE onto the compact serialization:
    ///
    /// ```text
    /// base64(protected) '.' base64(encrypted key) '.' base64(iv)
    ///     '.' base64(ciphertext) '.' base64(tag)
    /// ```
    ///
    /// The encrypted key segment is empty for ECDH-ES direct agreement.
    ///
    /// # Errors
    ///
    /// Returns an error if the JWE carries fields the compact serialization
    /// has no channel for (`aad`, `unprotected`, or `header`).
    pub fn encode(&self) -> Result<String> {
        if self.aad.is_some() || self.unprotected.is_some() || self.header.is_some() {
            return Err(Error::JweInvalid(
                "compact serialization cannot represent `aad` or unprotected headers".into(),
            ));
        }

        let protected = &self.protected;
        let encrypted_key = self.encrypted_key.as_deref().unwrap_or_default();
        let iv = &self.iv;
        let ciphertext = &self.ciphertext;
        let tag = &self.tag;

        Ok(format!("{protected}.{encrypted_key}.{iv}.{ciphertext}.{tag}"))
    }
}

impl Display for Jwe {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.encode().map_err(|_| fmt::Error)?)
    }
}

impl FromStr for Jwe {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() != 5 {
            return Err(Error::JweInvalid(format!(
                "compact JWE must have 5 segments, found {}",
                parts.len()
            )));
        }
        if parts[0].is_empty() {
            return Err(Error::JweInvalid("compact JWE `protected` segment is empty".into()));
        }
        if parts[2].is_empty() {
            return Err(Error::JweInvalid("compact JWE `iv` segment is empty".into()));
        }
        if parts[3].is_empty() {
            return Err(Error::JweInvalid("compact JWE `ciphertext` segment is empty".into()));
        }
        if parts[4].is_empty() {
            return Err(Error::JweInvalid("compact JWE `tag` segment is empty".into()));
        }

        Ok(Self {
            protected: parts[0].to_string(),
            encrypted_key: if parts[1].is_empty() { None } else { Some(parts[1].to_string()) },
            iv: parts[2].to_string(),
            ciphertext: parts[3].to_string(),
            tag: parts[4].to_string(),
            ..Self::default()
        })
    }
}

/// The output of a successful decryption.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Decrypted {
    /// The recovered plaintext.
    pub plaintext: Vec<u8>,

    /// The protected header.
    pub protected_header: Map<String, Value>,

    /// The shared unprotected header, when the JWE carried one.
    pub shared_unprotected_header: Option<Map<String, Value>>,

    /// The per-recipient unprotected header, when the JWE carried one.
    pub unprotected_header: Option<Map<String, Value>>,

    /// The decoded additional authenticated data, when the JWE carried any.
    pub additional_authenticated_data: Option<Vec<u8>>,
}

/// Options for [`JweBuilder::encrypt`].
#[derive(Clone, Debug, Default)]
pub struct EncryptOptions {
    /// Extension `crit` header parameter names the caller understands,
    /// mapped to whether each must be integrity protected.
    pub crit: Option<BTreeMap<String, bool>>,
}

/// Options for [`decrypt`] and [`decrypt_compact`].
#[derive(Clone, Debug, Default)]
pub struct DecryptOptions {
    /// Extension `crit` header parameter names the caller understands,
    /// mapped to whether each must be integrity protected.
    pub crit: Option<BTreeMap<String, bool>>,

    /// Allowed key management (`alg`) algorithm names. When unset, all
    /// supported algorithms are allowed and `PBES2*` is explicitly refused.
    pub key_management_algorithms: Option<Vec<String>>,

    /// Allowed content encryption (`enc`) algorithm names. When unset, all
    /// supported algorithms are allowed.
    pub content_encryption_algorithms: Option<Vec<String>>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn compact_segment_count() {
        assert!(Jwe::from_str("a.b.c.d").is_err());
        assert!(Jwe::from_str("a.b.c.d.e.f").is_err());
        assert!(Jwe::from_str("a..c.d.e").is_ok());
    }

    #[test]
    fn compact_empty_segments() {
        // protected, iv, ciphertext, and tag must be non-empty
        for compact in ["..c.d.e", "a...d.e", "a..c..e", "a..c.d."] {
            assert!(Jwe::from_str(compact).is_err(), "accepted {compact}");
        }
    }

    #[test]
    fn compact_round_trip() {
        let jwe = Jwe {
            protected: "eyJhIjoxfQ".to_string(),
            iv: "aXY".to_string(),
            ciphertext: "Y3Q".to_string(),
            tag: "dGFn".to_string(),
            ..Jwe::default()
        };

        let compact = jwe.encode().expect("should encode");
        assert_eq!(compact, "eyJhIjoxfQ..aXY.Y3Q.dGFn");
        assert_eq!(Jwe::from_str(&compact).expect("should parse"), jwe);
    }

    #[test]
    fn compact_cannot_carry_aad() {
        let jwe = Jwe {
            protected: "eyJhIjoxfQ".to_string(),
            iv: "aXY".to_string(),
            ciphertext: "Y3Q".to_string(),
            tag: "dGFn".to_string(),
            aad: Some("YWFk".to_string()),
            ..Jwe::default()
        };
        assert!(jwe.encode().is_err());
    }
}
