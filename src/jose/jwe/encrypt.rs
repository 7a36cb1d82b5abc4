//! Flattened JWE encryption.

use base64ct::{Base64UrlUnpadded as Base64, Encoding};
use serde_json::{Map, Value};

use super::{cek, EncryptOptions, Jwe};
use crate::aead;
use crate::ecc::ecdh::EcdhProvider;
use crate::error::{Container, Error};
use crate::jose::jwa::{CekAlgorithm, EncryptionAlgorithm};
use crate::jose::jwk::Jwk;
use crate::jose::{b64, header};
use crate::kdf::MAX_PARTY_INFO;
use crate::Result;

/// Key agreement party information, as raw bytes. Each value may be at most
/// 32 bytes and is base64url-encoded into the `apu`/`apv` header parameters.
#[derive(Clone, Debug, Default)]
pub struct KeyManagementParams {
    /// Agreement `PartyUInfo` (producer information).
    pub apu: Option<Vec<u8>>,

    /// Agreement `PartyVInfo` (consumer information).
    pub apv: Option<Vec<u8>>,
}

/// Builds a flattened JWE ([RFC7516 §7.2.2]) from a plaintext and a
/// recipient public key.
///
/// The builder is single-use: each header setter may be invoked at most once
/// and the terminal [`encrypt`](Self::encrypt) consumes the builder. Use
/// [`Jwe::encode`] on the result for the compact serialization.
///
/// ```rust,ignore
/// let jwe = JweBuilder::new()
///     .protected_header(header)
///     .encrypt(b"hello", &recipient_public, &EncryptOptions::default())
///     .await?;
/// ```
///
/// [RFC7516 §7.2.2]: https://www.rfc-editor.org/rfc/rfc7516#section-7.2.2
#[derive(Debug, Default)]
pub struct JweBuilder {
    protected: Option<Map<String, Value>>,
    shared_unprotected: Option<Map<String, Value>>,
    unprotected: Option<Map<String, Value>>,
    key_management: Option<KeyManagementParams>,
    aad: Option<Vec<u8>>,
    repeated: Option<&'static str>,
}

impl JweBuilder {
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

    /// Set the shared unprotected header. May only be called once.
    #[must_use]
    pub fn shared_unprotected_header(mut self, header: Map<String, Value>) -> Self {
        if self.shared_unprotected.is_some() {
            self.repeated.get_or_insert("shared_unprotected_header");
        }
        self.shared_unprotected = Some(header);
        self
    }

    /// Set the per-recipient unprotected header. May only be called once.
    #[must_use]
    pub fn unprotected_header(mut self, header: Map<String, Value>) -> Self {
        if self.unprotected.is_some() {
            self.repeated.get_or_insert("unprotected_header");
        }
        self.unprotected = Some(header);
        self
    }

    /// Set the key agreement party information. May only be called once.
    #[must_use]
    pub fn key_management_parameters(mut self, params: KeyManagementParams) -> Self {
        if self.key_management.is_some() {
            self.repeated.get_or_insert("key_management_parameters");
        }
        self.key_management = Some(params);
        self
    }

    /// Set additional authenticated data to bind into the encryption. The
    /// last value set wins.
    #[must_use]
    pub fn additional_authenticated_data(mut self, aad: impl Into<Vec<u8>>) -> Self {
        self.aad = Some(aad.into());
        self
    }

    /// Encrypt the plaintext for the recipient, returning a flattened JWE.
    ///
    /// The `alg` and `enc` header parameters select the key management and
    /// content encryption algorithms; the `epk` produced by key agreement
    /// (plus `apu`/`apv` when set) is merged into the protected header.
    ///
    /// # Errors
    ///
    /// Returns an error if the builder or headers are invalid, an algorithm
    /// or curve is unsupported, or encryption itself fails. Failures after
    /// validation are collapsed into a single generic error.
    pub async fn encrypt(
        self, plaintext: &[u8], recipient: &Jwk, options: &EncryptOptions,
    ) -> Result<Jwe> {
        const C: Container = Container::Jwe;

        if let Some(setter) = self.repeated {
            return Err(C.invalid(format!("`{setter}` may only be set once")));
        }
        let params = self.key_management.as_ref();
        for (name, value) in
            [("apu", params.and_then(|p| p.apu.as_ref())), ("apv", params.and_then(|p| p.apv.as_ref()))]
        {
            if value.is_some_and(|v| v.len() > MAX_PARTY_INFO) {
                return Err(C.invalid(format!("`{name}` must not exceed {MAX_PARTY_INFO} bytes")));
            }
        }

        // resolve the key agreement provider from the recipient key
        let provider = EcdhProvider::from_curve(recipient.crv)?;
        let recipient_public = provider.public_key_from_jwk(recipient)?;

        // compose and validate the JOSE header
        let merged = header::merge(
            &[self.protected.as_ref(), self.shared_unprotected.as_ref(), self.unprotected.as_ref()],
            C,
        )?;
        if merged.contains_key("zip") {
            return Err(Error::NotSupported("the `zip` parameter is not supported".into()));
        }
        let Some(protected) = &self.protected else {
            return Err(C.invalid("protected header must be present"));
        };
        header::validate_crit(protected, &merged, &[], options.crit.as_ref(), C)?;

        let Some(alg) = merged.get("alg").and_then(Value::as_str) else {
            return Err(C.invalid("`alg` is missing from the JOSE header"));
        };
        if alg != CekAlgorithm::EcdhEs.name() {
            return Err(Error::NotSupported(format!(
                "unsupported key management algorithm `{alg}`"
            )));
        }
        let Some(enc_name) = merged.get("enc").and_then(Value::as_str) else {
            return Err(C.invalid("`enc` is missing from the JOSE header"));
        };
        let Some(enc) = EncryptionAlgorithm::from_name(enc_name) else {
            return Err(Error::NotSupported(format!(
                "unknown content encryption algorithm `{enc_name}`"
            )));
        };

        // validation is done: collapse failures in the remaining pipeline so
        // internal state cannot be probed through error values
        self.seal(provider, &recipient_public, alg, enc, plaintext).map_err(|e| {
            tracing::debug!("encryption failed: {e}");
            Error::JweInvalid("failed to encrypt".into())
        })
    }

    // Derive the CEK, extend the protected header, and run the AEAD.
    fn seal(
        self, provider: EcdhProvider, recipient_public: &[u8], alg: &str,
        enc: EncryptionAlgorithm, plaintext: &[u8],
    ) -> Result<Jwe> {
        let params = self.key_management.unwrap_or_default();
        let key = cek::encryption_key(
            provider,
            recipient_public,
            alg,
            enc,
            params.apu.as_deref(),
            params.apv.as_deref(),
        )?;

        // extend the protected header with the agreement parameters,
        // never overwriting caller-provided entries
        let mut protected = self.protected.unwrap_or_default();
        for (name, value) in key.parameters {
            protected.entry(name).or_insert(value);
        }
        let encoded_protected = b64::encode_json(&protected, Container::Jwe)?;

        // Attach the AAD to the encoded protected header
        // (RFC 7516 §5.1, step 14).
        let aad = match &self.aad {
            Some(aad) => format!("{encoded_protected}.{}", Base64::encode_string(aad)),
            None => encoded_protected.clone(),
        };

        let sealed = aead::encrypt(enc, plaintext, &key.cek, aad.as_bytes())?;

        Ok(Jwe {
            protected: encoded_protected,
            encrypted_key: None,
            iv: Base64::encode_string(&sealed.iv),
            ciphertext: Base64::encode_string(&sealed.ciphertext),
            tag: Base64::encode_string(&sealed.tag),
            aad: self.aad.as_deref().map(Base64::encode_string),
            unprotected: self.shared_unprotected,
            header: self.unprotected,
        })
    }
}
