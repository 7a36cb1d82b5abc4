//! # JSON Web Signature (JWS)
//!
//! JWS ([RFC7515]) represents content secured with digital signatures using
//! JSON-based data structures. Cryptographic algorithms and identifiers for
//! use with this specification are described in the JWA ([RFC7518])
//! specification.
//!
//! The RFC 7797 `b64` header parameter is supported: when a protected header
//! opts in with `"b64": false` and lists it in `crit`, the payload is signed
//! raw and travels detached rather than base64url-encoded inside the
//! container.
//!
//! [RFC7515]: https://www.rfc-editor.org/rfc/rfc7515
//! [RFC7518]: https://www.rfc-editor.org/rfc/rfc7518

mod sign;
mod verify;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use self::sign::JwsBuilder;
pub use self::verify::{verify, verify_compact, verify_detached};
use crate::error::{Container, Error};
use crate::jose::b64;
use crate::jose::jwa::Algorithm;
use crate::Result;

// The library's default recognized `crit` parameters: `b64` is always
// treated as recognized and must be integrity protected.
pub(crate) const DEFAULT_CRIT: [(&str, bool); 1] = [("b64", true)];

/// A JWS in the flattened JSON serialization ([RFC7515 §7.2.2]).
///
/// [RFC7515 §7.2.2]: https://www.rfc-editor.org/rfc/rfc7515#section-7.2.2
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Jws {
    /// JWS protected header, as a base64url encoded string.
    pub protected: String,

    /// The payload, as a base64url encoded string. Empty when the protected
    /// header carries `"b64": false` — the payload then travels detached.
    pub payload: String,

    /// The signature, as a base64url encoded string.
    pub signature: String,

    /// Unprotected header as a JSON object.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<Map<String, Value>>,
}

impl Jws {
    /// Project the JWS onto the compact serialization:
    ///
    /// ```text
    /// base64(protected) '.' base64(payload) '.' base64(signature)
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error if the JWS was created with `"b64": false` — the
    /// compact serialization has no channel for a detached payload — or if
    /// it carries an unprotected header.
    pub fn encode(&self) -> Result<String> {
        if self.header.is_some() {
            return Err(Error::JwsInvalid(
                "compact serialization cannot represent an unprotected header".into(),
            ));
        }
        if self.payload.is_empty() {
            let protected = b64::parse_protected(&self.protected, Container::Jws)?;
            if protected.get("b64") == Some(&Value::Bool(false)) {
                return Err(Error::JwsInvalid(
                    "use the flattened serialization for a JWS with `b64: false`".into(),
                ));
            }
        }

        Ok(format!("{}.{}.{}", self.protected, self.payload, self.signature))
    }
}

impl Display for Jws {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.encode().map_err(|_| fmt::Error)?)
    }
}

impl FromStr for Jws {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(Error::JwsInvalid("compact JWS is empty".into()));
        }
        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() != 3 {
            return Err(Error::JwsInvalid(format!(
                "compact JWS must have 3 segments, found {}",
                parts.len()
            )));
        }

        Ok(Self {
            protected: parts[0].to_string(),
            payload: parts[1].to_string(),
            signature: parts[2].to_string(),
            header: None,
        })
    }
}

/// The output of a successful verification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Verified {
    /// The payload bytes the signature covers.
    pub payload: Vec<u8>,

    /// The protected header.
    pub protected_header: Map<String, Value>,

    /// The unprotected header, when the JWS carried one.
    pub unprotected_header: Option<Map<String, Value>>,
}

/// Options for [`JwsBuilder::sign`].
#[derive(Clone, Debug, Default)]
pub struct SignOptions {
    /// Extension `crit` header parameter names the caller understands,
    /// mapped to whether each must be integrity protected.
    pub crit: Option<BTreeMap<String, bool>>,
}

/// Options for [`verify`], [`verify_detached`], and [`verify_compact`].
#[derive(Clone, Debug, Default)]
pub struct VerifyOptions {
    /// Extension `crit` header parameter names the caller understands,
    /// mapped to whether each must be integrity protected.
    pub crit: Option<BTreeMap<String, bool>>,

    /// Allowed signing algorithms. When unset, all supported algorithms are
    /// allowed.
    pub algorithms: Option<Vec<Algorithm>>,
}

// Resolve the effective `b64` value (RFC 7797). The parameter only takes
// effect when it was opted into via `crit`; it defaults to true.
pub(crate) fn resolve_b64(
    protected: &Map<String, Value>, critical: &BTreeSet<String>,
) -> Result<bool> {
    if !critical.contains("b64") {
        return Ok(true);
    }
    match protected.get("b64") {
        None => Ok(true),
        Some(Value::Bool(b64)) => Ok(*b64),
        Some(_) => Err(Error::JwsInvalid("`b64` must be a boolean".into())),
    }
}
