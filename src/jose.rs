//! # JSON Object Signing and Encryption (JOSE)
//!
//! The JOSE container formats: JWE ([RFC7516]) and JWS ([RFC7515]) in their
//! flattened JSON and compact serializations, with JWK ([RFC7517]) key
//! representations and the JWA ([RFC7518]) algorithm registry.
//!
//! [RFC7515]: https://www.rfc-editor.org/rfc/rfc7515
//! [RFC7516]: https://www.rfc-editor.org/rfc/rfc7516
//! [RFC7517]: https://www.rfc-editor.org/rfc/rfc7517
//! [RFC7518]: https://www.rfc-editor.org/rfc/rfc7518

pub(crate) mod b64;
pub(crate) mod header;
pub mod jwa;
pub mod jwe;
pub mod jwk;
pub mod jws;
