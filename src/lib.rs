//! # JOSE containers
//!
//! This crate implements the two JOSE container formats for
//! cryptographically protected payloads:
//!
//! - **JWE** ([RFC7516]) — authenticated encryption using ECDH-ES direct key
//!   agreement and the AES-GCM / AES-CBC-HMAC content encryption
//!   algorithms.
//! - **JWS** ([RFC7515]) — digital signatures with ES256, ES384, ES512,
//!   ES256K, and EdDSA, including the RFC 7797 `b64` unencoded-payload
//!   option.
//!
//! Each format has a flattened JSON serialization and a compact
//! serialization; the compact form is a projection of the flattened form.
//! Operations are driven through single-use builders
//! ([`jose::jwe::JweBuilder`], [`jose::jws::JwsBuilder`]) and the
//! corresponding `decrypt`/`verify` functions, with keys supplied as JWKs
//! ([RFC7517]).
//!
//! Decryption follows the RFC 7516 §11.5 guidance: once a container has
//! passed validation, every failure surfaces as the same generic error with
//! a randomized delay, so callers cannot be used as a decryption oracle.
//!
//! [RFC7515]: https://www.rfc-editor.org/rfc/rfc7515
//! [RFC7516]: https://www.rfc-editor.org/rfc/rfc7516
//! [RFC7517]: https://www.rfc-editor.org/rfc/rfc7517

pub mod aead;
pub mod ecc;
pub mod error;
pub mod jose;
pub mod kdf;

pub use crate::error::{Error, Result};
pub use crate::jose::jwa::{Algorithm, CekAlgorithm, EncryptionAlgorithm};
pub use crate::jose::jwe::{
    Decrypted, DecryptOptions, EncryptOptions, Jwe, JweBuilder, KeyManagementParams,
};
pub use crate::jose::jwk::{Curve, Jwk, Jwks, KeyType, KeyUse};
pub use crate::jose::jws::{Jws, JwsBuilder, SignOptions, Verified, VerifyOptions};
