//! Preference values and patches.
//!
//! Values form a closed tagged union shared by snapshots (app → companion)
//! and patches (companion → app).

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single preference value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PreferenceValue {
    /// UTF-8 string.
    String(String),
    /// Signed integer.
    Int(i64),
    /// Boolean.
    Bool(bool),
    /// Floating point number.
    Double(f64),
    /// Raw bytes, base64 on the wire.
    Bytes(#[serde(with = "base64_bytes")] Vec<u8>),
    /// Point in time, RFC 3339 on the wire.
    Date(DateTime<Utc>),
    /// Explicit null. In a patch this deletes the key.
    Null,
    /// Ordered list of values.
    Array(Vec<PreferenceValue>),
    /// String-keyed map of values.
    Map(BTreeMap<String, PreferenceValue>),
}

impl PreferenceValue {
    /// Check if this is the explicit null value.
    pub fn is_null(&self) -> bool {
        matches!(self, PreferenceValue::Null)
    }
}

impl fmt::Display for PreferenceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreferenceValue::String(s) => f.write_str(s),
            PreferenceValue::Int(i) => write!(f, "{i}"),
            PreferenceValue::Bool(b) => write!(f, "{b}"),
            PreferenceValue::Double(d) => write!(f, "{d}"),
            PreferenceValue::Bytes(b) => write!(f, "{} bytes", b.len()),
            PreferenceValue::Date(d) => write!(f, "{}", d.to_rfc3339()),
            PreferenceValue::Null => f.write_str("∅"),
            PreferenceValue::Array(items) => write!(f, "[{} items]", items.len()),
            PreferenceValue::Map(entries) => write!(f, "{{{} entries}}", entries.len()),
        }
    }
}

impl From<&str> for PreferenceValue {
    fn from(value: &str) -> Self {
        PreferenceValue::String(value.to_owned())
    }
}

impl From<String> for PreferenceValue {
    fn from(value: String) -> Self {
        PreferenceValue::String(value)
    }
}

impl From<i64> for PreferenceValue {
    fn from(value: i64) -> Self {
        PreferenceValue::Int(value)
    }
}

impl From<bool> for PreferenceValue {
    fn from(value: bool) -> Self {
        PreferenceValue::Bool(value)
    }
}

impl From<f64> for PreferenceValue {
    fn from(value: f64) -> Self {
        PreferenceValue::Double(value)
    }
}

impl From<Vec<u8>> for PreferenceValue {
    fn from(value: Vec<u8>) -> Self {
        PreferenceValue::Bytes(value)
    }
}

impl From<DateTime<Utc>> for PreferenceValue {
    fn from(value: DateTime<Utc>) -> Self {
        PreferenceValue::Date(value)
    }
}

/// Set or delete one preference key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferencePatch {
    /// Preference key.
    pub key: String,
    /// New value. `None` or `Null` deletes the key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<PreferenceValue>,
}

impl PreferencePatch {
    /// Patch that sets `key` to `value`.
    pub fn set(key: impl Into<String>, value: impl Into<PreferenceValue>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
        }
    }

    /// Patch that deletes `key`.
    pub fn delete(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: None,
        }
    }

    /// Check if applying this patch removes the key.
    pub fn is_delete(&self) -> bool {
        self.value.as_ref().is_none_or(PreferenceValue::is_null)
    }
}

mod base64_bytes {
    use base64::{Engine, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded.as_bytes()).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_wire_shapes() {
        assert_eq!(
            serde_json::to_value(PreferenceValue::from("x")).unwrap(),
            json!({"string": "x"})
        );
        assert_eq!(
            serde_json::to_value(PreferenceValue::Int(3)).unwrap(),
            json!({"int": 3})
        );
        assert_eq!(
            serde_json::to_value(PreferenceValue::Bytes(vec![1, 2, 3])).unwrap(),
            json!({"bytes": "AQID"})
        );
        assert_eq!(
            serde_json::to_value(PreferenceValue::Null).unwrap(),
            json!("null")
        );
    }

    #[test]
    fn test_nested_values() {
        let mut map = BTreeMap::new();
        map.insert("langs".to_owned(), PreferenceValue::Array(vec!["en".into(), "de".into()]));
        let value = PreferenceValue::Map(map);

        let text = serde_json::to_string(&value).unwrap();
        let back: PreferenceValue = serde_json::from_str(&text).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn test_bad_base64_rejected() {
        let result = serde_json::from_value::<PreferenceValue>(json!({"bytes": "***"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_patch_delete_semantics() {
        assert!(PreferencePatch::delete("k").is_delete());
        assert!(
            PreferencePatch {
                key: "k".into(),
                value: Some(PreferenceValue::Null)
            }
            .is_delete()
        );
        assert!(!PreferencePatch::set("k", 1i64).is_delete());

        // Absent value decodes as delete
        let patch: PreferencePatch = serde_json::from_value(json!({"key": "gone"})).unwrap();
        assert!(patch.is_delete());
    }

    #[test]
    fn test_display() {
        assert_eq!(PreferenceValue::Bool(true).to_string(), "true");
        assert_eq!(PreferenceValue::Bytes(vec![0; 4]).to_string(), "4 bytes");
        assert_eq!(PreferenceValue::Null.to_string(), "∅");
    }
}
