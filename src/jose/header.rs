//! JOSE header composition and Critical (`crit`) header validation.
//!
//! In the JSON serializations the members of the JOSE Header are the union of
//! the members of the protected header and the unprotected header positions
//! that are present. Parameter names must not be repeated across positions,
//! and at least the protected header must be present and non-empty.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Map, Value};

use crate::error::Container;
use crate::Result;

/// Merge header positions into a single JOSE header. `positions[0]` is the
/// protected header; the remainder are the unprotected positions in
/// precedence order.
pub(crate) fn merge(
    positions: &[Option<&Map<String, Value>>], c: Container,
) -> Result<Map<String, Value>> {
    let Some(protected) = positions.first().copied().flatten() else {
        return Err(c.invalid("protected header must be present"));
    };
    if protected.is_empty() {
        return Err(c.invalid("protected header is empty"));
    }

    let mut merged = Map::new();
    for position in positions.iter().copied().flatten() {
        for (name, value) in position {
            if merged.contains_key(name) {
                return Err(c.invalid(format!(
                    "header parameter `{name}` occurs in more than one header position"
                )));
            }
            merged.insert(name.clone(), value.clone());
        }
    }

    Ok(merged)
}

/// Validate the `crit` (Critical) header parameter ([RFC7515 §4.1.11]) and
/// return the set of recognized critical parameter names.
///
/// `defaults` is the library's recognized set for the operation; `extensions`
/// is the caller-supplied option set. Both map a parameter name to whether it
/// must be integrity protected (carried in the protected header).
///
/// [RFC7515 §4.1.11]: https://www.rfc-editor.org/rfc/rfc7515#section-4.1.11
pub(crate) fn validate_crit(
    protected: &Map<String, Value>, merged: &Map<String, Value>, defaults: &[(&str, bool)],
    extensions: Option<&BTreeMap<String, bool>>, c: Container,
) -> Result<BTreeSet<String>> {
    if !merged.contains_key("crit") {
        return Ok(BTreeSet::new());
    }
    let Some(value) = protected.get("crit") else {
        return Err(c.invalid("`crit` must be integrity protected"));
    };
    let Value::Array(names) = value else {
        return Err(c.invalid("`crit` must be an array of non-empty strings"));
    };
    if names.is_empty() {
        return Err(c.invalid("`crit` must be an array of non-empty strings"));
    }

    let mut recognized = BTreeSet::new();
    for entry in names {
        let Some(name) = entry.as_str().filter(|n| !n.is_empty()) else {
            return Err(c.invalid("`crit` must be an array of non-empty strings"));
        };

        let integrity_protected = if let Some((_, p)) = defaults.iter().find(|(n, _)| *n == name) {
            *p
        } else if let Some(p) = extensions.and_then(|e| e.get(name)) {
            *p
        } else {
            return Err(c.invalid(format!("`crit` parameter `{name}` is not recognized")));
        };

        if !merged.contains_key(name) {
            return Err(c.invalid(format!(
                "`crit` parameter `{name}` is absent from the JOSE header"
            )));
        }
        if integrity_protected && !protected.contains_key(name) {
            return Err(c.invalid(format!("`{name}` must be integrity protected")));
        }

        recognized.insert(name.to_string());
    }

    Ok(recognized)
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().expect("should be an object").clone()
    }

    #[test]
    fn union_of_positions() {
        let protected = map(json!({"alg": "ECDH-ES"}));
        let shared = map(json!({"enc": "A256GCM"}));
        let recipient = map(json!({"kid": "key-1"}));

        let merged = merge(&[Some(&protected), Some(&shared), Some(&recipient)], Container::Jwe)
            .expect("should merge");
        assert_eq!(merged.len(), 3);
        assert_eq!(merged.get("kid"), Some(&json!("key-1")));
    }

    #[test]
    fn positions_must_be_disjoint() {
        let protected = map(json!({"alg": "ECDH-ES", "enc": "A256GCM"}));
        let shared = map(json!({"enc": "A128GCM"}));

        let err =
            merge(&[Some(&protected), Some(&shared)], Container::Jwe).expect_err("should fail");
        assert!(err.to_string().contains("`enc`"));
    }

    #[test]
    fn protected_required() {
        let shared = map(json!({"enc": "A256GCM"}));
        assert!(merge(&[None, Some(&shared)], Container::Jwe).is_err());

        let empty = Map::new();
        assert!(merge(&[Some(&empty), Some(&shared)], Container::Jwe).is_err());
    }

    #[test]
    fn crit_must_be_protected() {
        let protected = map(json!({"alg": "ES256", "b64": false}));
        let unprotected = map(json!({"crit": ["b64"]}));
        let merged =
            merge(&[Some(&protected), Some(&unprotected)], Container::Jws).expect("should merge");

        let err = validate_crit(&protected, &merged, &[("b64", true)], None, Container::Jws)
            .expect_err("should fail");
        assert!(err.to_string().contains("integrity protected"));
    }

    #[test]
    fn crit_names_must_be_recognized() {
        let protected = map(json!({"alg": "ES256", "crit": ["exp"], "exp": 1234}));
        let merged = merge(&[Some(&protected)], Container::Jws).expect("should merge");

        let err = validate_crit(&protected, &merged, &[("b64", true)], None, Container::Jws)
            .expect_err("should fail");
        assert!(err.to_string().contains("not recognized"));

        let mut extensions = BTreeMap::new();
        extensions.insert("exp".to_string(), true);
        let recognized =
            validate_crit(&protected, &merged, &[("b64", true)], Some(&extensions), Container::Jws)
                .expect("should validate");
        assert!(recognized.contains("exp"));
    }

    #[test]
    fn crit_names_must_be_present() {
        let protected = map(json!({"alg": "ES256", "crit": ["b64"]}));
        let merged = merge(&[Some(&protected)], Container::Jws).expect("should merge");

        let err = validate_crit(&protected, &merged, &[("b64", true)], None, Container::Jws)
            .expect_err("should fail");
        assert!(err.to_string().contains("absent"));
    }

    #[test]
    fn flagged_names_must_be_in_protected_position() {
        let protected = map(json!({"alg": "ES256", "crit": ["b64"]}));
        let unprotected = map(json!({"b64": false}));
        let merged =
            merge(&[Some(&protected), Some(&unprotected)], Container::Jws).expect("should merge");

        let err = validate_crit(&protected, &merged, &[("b64", true)], None, Container::Jws)
            .expect_err("should fail");
        assert!(err.to_string().contains("`b64` must be integrity protected"));
    }

    #[test]
    fn crit_malformed() {
        for crit in [json!("b64"), json!([]), json!([""]), json!([42])] {
            let protected = map(json!({"alg": "ES256", "crit": crit, "b64": true}));
            let merged = merge(&[Some(&protected)], Container::Jws).expect("should merge");
            assert!(
                validate_crit(&protected, &merged, &[("b64", true)], None, Container::Jws).is_err()
            );
        }
    }

    #[test]
    fn absent_crit_recognizes_nothing() {
        let protected = map(json!({"alg": "ES256"}));
        let merged = merge(&[Some(&protected)], Container::Jws).expect("should merge");

        let recognized = validate_crit(&protected, &merged, &[("b64", true)], None, Container::Jws)
            .expect("should validate");
        assert!(recognized.is_empty());
    }
}
