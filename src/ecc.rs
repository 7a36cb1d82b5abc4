//! Elliptic-curve providers.
//!
//! Curve support is expressed as capability sets keyed on the JWK `crv`
//! parameter: [`ecdh::EcdhProvider`] for key agreement and
//! [`sign::SignatureProvider`] for signing. The two sets overlap but are not
//! identical — the NIST P-curves do both, X25519 only agrees, and secp256k1
//! and Ed25519 only sign.

pub mod ecdh;
pub mod sign;
