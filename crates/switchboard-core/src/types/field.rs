//! Entry field maps
//!
//! Tool callers send fields as an arbitrary JSON object. Only scalar values
//! are accepted; they are checked here, once, and stored as text.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Why a JSON object is not a valid field map
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldMapError {
    #[error("fields must contain at least one entry")]
    Empty,

    #[error("field names must not be empty")]
    EmptyKey,

    #[error("field {field:?} has unsupported {kind} value; expected string, number or boolean")]
    UnsupportedValue { field: String, kind: &'static str },
}

/// A scalar field value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    /// Convert a JSON value, rejecting nulls, arrays and objects
    pub fn from_json(field: &str, value: &Value) -> Result<Self, FieldMapError> {
        let unsupported = |kind| FieldMapError::UnsupportedValue {
            field: field.to_string(),
            kind,
        };
        match value {
            Value::String(s) => Ok(FieldValue::Text(s.clone())),
            Value::Bool(b) => Ok(FieldValue::Bool(*b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(FieldValue::Integer(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(FieldValue::Float(f))
                } else {
                    Err(unsupported("numeric"))
                }
            }
            Value::Null => Err(unsupported("null")),
            Value::Array(_) => Err(unsupported("array")),
            Value::Object(_) => Err(unsupported("object")),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Float(x) => write!(f, "{}", x),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Integer(i)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

/// A non-empty, ordered set of entry fields
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMap {
    fields: Vec<(String, FieldValue)>,
}

impl FieldMap {
    /// Build a field map from a JSON object, keeping its key order
    pub fn from_json(object: &Map<String, Value>) -> Result<Self, FieldMapError> {
        let fields = object
            .iter()
            .map(|(key, value)| {
                if key.is_empty() {
                    return Err(FieldMapError::EmptyKey);
                }
                Ok((key.clone(), FieldValue::from_json(key, value)?))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_pairs(fields)
    }

    /// Build a field map from key/value pairs
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Result<Self, FieldMapError>
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        let fields: Vec<(String, FieldValue)> = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        if fields.is_empty() {
            return Err(FieldMapError::Empty);
        }
        if fields.iter().any(|(k, _)| k.is_empty()) {
            return Err(FieldMapError::EmptyKey);
        }
        Ok(Self { fields })
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Fields in the text form the broker stores
    pub fn to_text_pairs(&self) -> Vec<(String, String)> {
        self.fields
            .iter()
            .map(|(k, v)| (k.clone(), v.to_string()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_mixed_scalars() {
        let map = FieldMap::from_json(&object(json!({
            "msg": "hello",
            "n": 42,
            "ratio": 0.5,
            "urgent": true
        })))
        .unwrap();

        assert_eq!(map.len(), 4);
        let text: std::collections::BTreeMap<_, _> = map.to_text_pairs().into_iter().collect();
        assert_eq!(text["msg"], "hello");
        assert_eq!(text["n"], "42");
        assert_eq!(text["ratio"], "0.5");
        assert_eq!(text["urgent"], "true");
    }

    #[test]
    fn test_keeps_caller_order() {
        let map: FieldMap = FieldMap::from_json(
            &serde_json::from_str(r#"{"z": 1, "a": 2, "m": "x"}"#).unwrap(),
        )
        .unwrap();
        let keys: Vec<String> = map.to_text_pairs().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_rejects_empty() {
        assert_eq!(FieldMap::from_json(&object(json!({}))), Err(FieldMapError::Empty));
    }

    #[test]
    fn test_rejects_non_scalars() {
        for (bad, kind) in [
            (json!({"a": null}), "null"),
            (json!({"a": [1, 2]}), "array"),
            (json!({"a": {"b": 1}}), "object"),
        ] {
            match FieldMap::from_json(&object(bad)) {
                Err(FieldMapError::UnsupportedValue { field, kind: k }) => {
                    assert_eq!(field, "a");
                    assert_eq!(k, kind);
                }
                other => panic!("expected unsupported value, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_rejects_empty_key() {
        assert_eq!(
            FieldMap::from_json(&object(json!({"": "x"}))),
            Err(FieldMapError::EmptyKey)
        );
    }
}
