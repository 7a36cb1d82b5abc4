//! Flattened JWS signing.

use base64ct::{Base64UrlUnpadded as Base64, Encoding};
use serde_json::{Map, Value};

use super::{resolve_b64, Jws, SignOptions, DEFAULT_CRIT};
use crate::ecc::sign::SignatureProvider;
use crate::error::{Container, Error};
use crate::jose::jwa::Algorithm;
use crate::jose::jwk::Jwk;
use crate::jose::{b64, header};
use crate::Result;

/// Builds a flattened JWS ([RFC7515 §7.2.2]) over a payload with a signing
/// key.
///
/// The builder is single-use: each header setter may be invoked at most once
/// and the terminal [`sign`](Self::sign) consumes the builder. Use
/// [`Jws::encode`] on the result for the compact serialization.
///
/// ```rust,ignore
/// let jws = JwsBuilder::new()
///     .protected_header(header)
///     .sign(b"payload", &signing_key, &SignOptions::default())
///     .await?;
/// ```
///
/// [RFC7515 §7.2.2]: https://www.rfc-editor.org/rfc/rfc7515#section-7.2.2
#[derive(Debug, Default)]
pub struct JwsBuilder {
    protected: Option<Map<String, Value>>,
    unprotected: Option<Map<String, Value>>,
    repeated: Option<&'static str>,
}

impl JwsBuilder {
    /// Create a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the protected header. May only be called once.
    #[must_use]
    pub fn protected_header(mut self, header: Map<String, Value>) -> Self {
        if self.protected.is_some() {
            self.repeated.get_or_insert("protected_header");
        }
        self.protected = Some(header);
        self
    }

    /// Set the unprotected header. May only be called once.
    #[must_use]
    pub fn unprotected_header(mut self, header: Map<String, Value>) -> Self {
        if self.unprotected.is_some() {
            self.repeated.get_or_insert("unprotected_header");
        }
        self.unprotected = Some(header);
        self
    }

    /// Sign the payload, returning a flattened JWS.
    ///
    /// The protected header's `alg` must name the canonical JWS algorithm
    /// for the signing key's curve. With `"b64": false` (opted into via
    /// `crit`) the payload is signed raw and the container's `payload` field
    /// is left empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the builder or headers are invalid, the
    /// algorithm is unsupported or disagrees with the key, or signing
    /// itself fails. Failures after validation are collapsed into a single
    /// generic error.
    pub async fn sign(self, payload: &[u8], signer: &Jwk, options: &SignOptions) -> Result<Jws> {
        const C: Container = Container::Jws;

        if let Some(setter) = self.repeated {
            return Err(C.invalid(format!("`{setter}` may only be set once")));
        }

        // resolve the signature provider from the signing key
        let provider = SignatureProvider::from_curve(signer.crv)?;

        // compose and validate the JOSE header
        let merged = header::merge(&[self.protected.as_ref(), self.unprotected.as_ref()], C)?;
        let Some(protected) = &self.protected else {
            return Err(C.invalid("protected header must be present"));
        };
        let critical =
            header::validate_crit(protected, &merged, &DEFAULT_CRIT, options.crit.as_ref(), C)?;
        let b64 = resolve_b64(protected, &critical)?;

        let Some(alg_name) = merged.get("alg").and_then(Value::as_str) else {
            return Err(C.invalid("`alg` is missing from the JOSE header"));
        };
        let Some(alg) = Algorithm::from_name(alg_name) else {
            return Err(Error::NotSupported(format!("unknown signing algorithm `{alg_name}`")));
        };
        if alg != provider.algorithm() {
            return Err(C.invalid(format!(
                "`alg` {alg} does not match the signing key curve `{}`",
                signer.crv
            )));
        }

        // build the signing input: protected '.' payload, with the payload
        // base64url-encoded unless b64 is false (RFC 7797)
        let encoded_protected = b64::encode_json(protected, C)?;
        let (signing_input, payload_field) = if b64 {
            let encoded_payload = Base64::encode_string(payload);
            (format!("{encoded_protected}.{encoded_payload}").into_bytes(), encoded_payload)
        } else {
            let mut input = format!("{encoded_protected}.").into_bytes();
            input.extend_from_slice(payload);
            (input, String::new())
        };

        // validation is done: collapse signing failures
        let signature = provider.sign(signer, &signing_input).map_err(|e| {
            tracing::debug!("signing failed: {e}");
            Error::JwsInvalid("failed to sign payload".into())
        })?;

        Ok(Jws {
            protected: encoded_protected,
            payload: payload_field,
            signature: Base64::encode_string(&signature),
            header: self.unprotected,
        })
    }
}
