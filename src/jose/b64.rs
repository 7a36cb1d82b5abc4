//! Base64url codec helpers shared by the JWE and JWS pipelines.
//!
//! Failures are labelled with the field being decoded so shape errors point
//! at the offending part of the container.

use base64ct::{Base64UrlUnpadded as Base64, Encoding};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::Container;
use crate::Result;

/// Decode a base64url field, labelling failures with the field name.
pub(crate) fn decode(field: &str, value: &str, c: Container) -> Result<Vec<u8>> {
    Base64::decode_vec(value).map_err(|e| c.invalid(format!("issue decoding `{field}`: {e}")))
}

/// Decode an optional base64url field.
pub(crate) fn decode_optional(
    field: &str, value: Option<&str>, c: Container,
) -> Result<Option<Vec<u8>>> {
    value.map(|v| decode(field, v, c)).transpose()
}

/// Serialize a value to JSON and base64url-encode the result.
pub(crate) fn encode_json(value: &impl Serialize, c: Container) -> Result<String> {
    let bytes = serde_json::to_vec(value)
        .map_err(|e| c.invalid(format!("issue serializing header: {e}")))?;
    Ok(Base64::encode_string(&bytes))
}

/// Parse an encoded protected header: base64url → UTF-8 JSON → non-empty
/// object.
pub(crate) fn parse_protected(encoded: &str, c: Container) -> Result<Map<String, Value>> {
    if encoded.is_empty() {
        return Err(c.invalid("`protected` is missing"));
    }
    let bytes = decode("protected", encoded, c)?;
    let value: Value = serde_json::from_slice(&bytes)
        .map_err(|e| c.invalid(format!("issue deserializing `protected` header: {e}")))?;
    let Value::Object(header) = value else {
        return Err(c.invalid("`protected` header is not a JSON object"));
    };
    if header.is_empty() {
        return Err(c.invalid("`protected` header is empty"));
    }
    Ok(header)
}
