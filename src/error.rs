//! Error types shared by the JWE and JWS operations.

use thiserror::Error;

/// Result type for JWE and JWS operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by JWE and JWS operations.
///
/// The variants are deliberately coarse: operations that protect secrets
/// collapse their internal failures into a single `invalid` value so callers
/// cannot distinguish, for example, ciphertext tampering from key-derivation
/// failure. Verification is the exception — a well-formed JWS whose signature
/// does not check out raises [`Error::SignatureVerification`] so callers can
/// tell shape errors and bad signatures apart.
#[derive(Debug, Error)]
pub enum Error {
    /// The JWE input, container, or header set is malformed.
    #[error("JWE invalid: {0}")]
    JweInvalid(String),

    /// The JWS input, container, or header set is malformed.
    #[error("JWS invalid: {0}")]
    JwsInvalid(String),

    /// The input is well-formed but names an algorithm, curve, or parameter
    /// this implementation does not handle.
    #[error("not supported: {0}")]
    NotSupported(String),

    /// The JWS signature did not verify against the provided key.
    #[error("signature verification failed")]
    SignatureVerification,
}

/// The container a shared validation step is running for. Merging, `crit`
/// checking, and the base64url codec are common to JWE and JWS but must
/// raise the matching `invalid` flavor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Container {
    Jwe,
    Jws,
}

impl Container {
    pub fn invalid(self, msg: impl Into<String>) -> Error {
        match self {
            Self::Jwe => Error::JweInvalid(msg.into()),
            Self::Jws => Error::JwsInvalid(msg.into()),
        }
    }
}
