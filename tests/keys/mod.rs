//! Key generation helpers for the JWE and JWS test suites.

#![allow(dead_code)]

use base64ct::{Base64UrlUnpadded as Base64, Encoding};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use rand::rngs::OsRng;
use vercre_jose::{Curve, Jwk, KeyType};

/// Generate a fresh private key JWK on the given curve.
pub fn generate(curve: Curve) -> Jwk {
    match curve {
        Curve::P256 => {
            let secret = p256::SecretKey::random(&mut OsRng);
            let point = secret.public_key().to_encoded_point(false);
            ec_jwk(
                curve,
                point.x().expect("should have x"),
                point.y().expect("should have y"),
                &secret.to_bytes(),
            )
        }
        Curve::P384 => {
            let secret = p384::SecretKey::random(&mut OsRng);
            let point = secret.public_key().to_encoded_point(false);
            ec_jwk(
                curve,
                point.x().expect("should have x"),
                point.y().expect("should have y"),
                &secret.to_bytes(),
            )
        }
        Curve::P521 => {
            let secret = p521::SecretKey::random(&mut OsRng);
            let point = secret.public_key().to_encoded_point(false);
            ec_jwk(
                curve,
                point.x().expect("should have x"),
                point.y().expect("should have y"),
                &secret.to_bytes(),
            )
        }
        Curve::Secp256k1 => {
            let secret = k256::SecretKey::random(&mut OsRng);
            let point = secret.public_key().to_encoded_point(false);
            ec_jwk(
                curve,
                point.x().expect("should have x"),
                point.y().expect("should have y"),
                &secret.to_bytes(),
            )
        }
        Curve::Ed25519 => {
            let signing_key = ed25519_dalek::SigningKey::generate(&mut OsRng);
            Jwk {
                kty: KeyType::Okp,
                crv: curve,
                x: Base64::encode_string(signing_key.verifying_key().as_bytes()),
                d: Some(Base64::encode_string(signing_key.as_bytes())),
                ..Jwk::default()
            }
        }
        Curve::X25519 => {
            let secret = x25519_dalek::StaticSecret::random_from_rng(OsRng);
            let public = x25519_dalek::PublicKey::from(&secret);
            Jwk {
                kty: KeyType::Okp,
                crv: curve,
                x: Base64::encode_string(public.as_bytes()),
                d: Some(Base64::encode_string(&secret.to_bytes())),
                ..Jwk::default()
            }
        }
    }
}

fn ec_jwk(curve: Curve, x: &[u8], y: &[u8], d: &[u8]) -> Jwk {
    Jwk {
        kty: KeyType::Ec,
        crv: curve,
        x: Base64::encode_string(x),
        y: Some(Base64::encode_string(y)),
        d: Some(Base64::encode_string(d)),
        ..Jwk::default()
    }
}
