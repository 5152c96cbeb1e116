//! JSON containment matcher.
//!
//! Compares a request value against a configured JSON document using
//! asymmetric containment: iteration is driven by the *actual* value, so
//! every key the request carries must exist in the configured document
//! with the identical concrete type and deep-equal content, while keys
//! present only in the configured document are ignored. Existing
//! expectation files depend on this direction; do not flip it to
//! symmetric deep equality.

use super::Matcher;
use crate::error::ExpectationError;
use serde_json::Value;
use tracing::warn;

pub struct JsonObjectMatcher;

impl Matcher for JsonObjectMatcher {
    fn matches(&self, actual: Option<&str>, expected: &str) -> Result<bool, ExpectationError> {
        // The configured value must be valid JSON; anything else is a
        // configuration error, not a mismatch.
        let expected_value: Value = serde_json::from_str(expected)
            .map_err(|e| ExpectationError::InvalidJsonCondition(e.to_string()))?;

        let Some(actual) = actual else {
            return Ok(false);
        };

        let actual_value = match serde_json::from_str::<Value>(actual) {
            Ok(value) => value,
            Err(_) => {
                warn!("invalid JSON received in request: {actual}");
                // Degrade to an opaque string; structural comparison
                // against it cannot succeed.
                return Ok(false);
            }
        };

        if !is_structured(&actual_value) || !is_structured(&expected_value) {
            return Ok(false);
        }

        Ok(contained_in(&actual_value, &expected_value))
    }
}

fn is_structured(value: &Value) -> bool {
    value.is_object() || value.is_array()
}

/// True when every entry of `actual` exists in `expected` with the same
/// concrete type and deep-equal content.
fn contained_in(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Object(actual_map), Value::Object(expected_map)) => {
            actual_map.iter().all(|(key, actual_value)| {
                expected_map
                    .get(key)
                    .is_some_and(|expected_value| same_type_and_value(actual_value, expected_value))
            })
        }
        (Value::Array(actual_items), Value::Array(expected_items)) => {
            actual_items.len() <= expected_items.len()
                && actual_items
                    .iter()
                    .zip(expected_items)
                    .all(|(a, e)| same_type_and_value(a, e))
        }
        _ => false,
    }
}

fn same_type_and_value(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Object(_), Value::Object(_)) | (Value::Array(_), Value::Array(_)) => {
            contained_in(actual, expected)
        }
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(e)) => a == e,
        (Value::String(a), Value::String(e)) => a == e,
        // Integers and floats are distinct types: 1 does not match 1.0.
        (Value::Number(a), Value::Number(e)) => match (a.as_i64(), e.as_i64()) {
            (Some(a), Some(e)) => a == e,
            (None, None) => a.as_f64() == e.as_f64(),
            _ => false,
        },
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(actual: &str, expected: &str) -> Result<bool, ExpectationError> {
        JsonObjectMatcher.matches(Some(actual), expected)
    }

    #[test]
    fn test_configured_superset_matches() {
        assert!(matches(r#"{"a":1}"#, r#"{"a":1,"b":2}"#).unwrap());
    }

    #[test]
    fn test_actual_with_unmatched_key_fails() {
        assert!(!matches(r#"{"a":1,"b":2}"#, r#"{"a":1}"#).unwrap());
    }

    #[test]
    fn test_non_json_actual_degrades_to_no_match() {
        assert!(!matches("not json", r#"{"a":1}"#).unwrap());
    }

    #[test]
    fn test_invalid_expected_json_is_config_error() {
        assert!(matches!(
            matches(r#"{"a":1}"#, "{broken"),
            Err(ExpectationError::InvalidJsonCondition(_))
        ));
    }

    #[test]
    fn test_nested_containment() {
        assert!(matches(
            r#"{"user":{"id":7,"tags":["a"]}}"#,
            r#"{"user":{"id":7,"name":"x","tags":["a","b"]},"extra":true}"#
        )
        .unwrap());
        assert!(!matches(
            r#"{"user":{"id":7,"role":"admin"}}"#,
            r#"{"user":{"id":7}}"#
        )
        .unwrap());
    }

    #[test]
    fn test_type_mismatch_fails() {
        assert!(!matches(r#"{"a":1}"#, r#"{"a":"1"}"#).unwrap());
        assert!(!matches(r#"{"a":1}"#, r#"{"a":1.0}"#).unwrap());
        assert!(!matches(r#"{"a":null}"#, r#"{"a":0}"#).unwrap());
    }

    #[test]
    fn test_scalar_values_never_match() {
        assert!(!matches("42", "42").unwrap());
        assert!(!matches(r#""text""#, r#""text""#).unwrap());
    }

    #[test]
    fn test_array_prefix_containment() {
        assert!(matches("[1,2]", "[1,2,3]").unwrap());
        assert!(!matches("[1,2,3]", "[1,2]").unwrap());
        assert!(!matches("[1,3]", "[1,2,3]").unwrap());
    }

    #[test]
    fn test_missing_actual_value_fails() {
        assert!(!JsonObjectMatcher.matches(None, r#"{"a":1}"#).unwrap());
    }
}
