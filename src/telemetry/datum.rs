// SPDX-License-Identifier: MIT

//! Telemetry data and source descriptors

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Field every datum uses to name the source it came from
pub const SOURCE_FIELD: &str = "id";

/// One telemetry sample: field name to value
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Datum(Map<String, Value>);

impl Datum {
    /// Create an empty datum ("no information")
    pub fn empty() -> Self {
        Self(Map::new())
    }

    /// Create a datum for a source with the given fields
    pub fn for_source(source_key: &str, fields: Value) -> Self {
        let mut map = match fields {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        map.insert(SOURCE_FIELD.to_string(), Value::String(source_key.to_string()));
        Self(map)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Value) {
        self.0.insert(field.into(), value);
    }

    /// Canonical key of the source this datum came from
    pub fn source_key(&self) -> Option<&str> {
        self.0.get(SOURCE_FIELD).and_then(Value::as_str)
    }
}

impl From<Map<String, Value>> for Datum {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for Datum {
    type Error = Value;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(other),
        }
    }
}

/// Identifier of a telemetry-producing object
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Identifier {
    #[serde(default)]
    pub namespace: String,
    pub key: String,
}

impl Identifier {
    pub fn new(namespace: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            key: key.into(),
        }
    }

    /// Identifier in the default namespace
    pub fn local(key: impl Into<String>) -> Self {
        Self::new("", key)
    }
}

/// Descriptor for one telemetry source
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TelemetryObject {
    pub identifier: Identifier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl TelemetryObject {
    pub fn new(identifier: Identifier) -> Self {
        Self {
            identifier,
            name: None,
        }
    }
}

/// Known sources keyed by caller-chosen key, iterated in key order
pub type SourceMap = BTreeMap<String, TelemetryObject>;

/// Normalizes source identifiers to canonical string keys
pub trait KeyNormalizer: Send + Sync {
    fn make_key_string(&self, identifier: &Identifier) -> String;
}

/// `namespace:key`, with `:` inside the namespace escaped; bare `key` without namespace
#[derive(Debug, Clone, Copy, Default)]
pub struct NamespacedKeys;

impl KeyNormalizer for NamespacedKeys {
    fn make_key_string(&self, identifier: &Identifier) -> String {
        make_key_string(identifier)
    }
}

pub fn make_key_string(identifier: &Identifier) -> String {
    if identifier.namespace.is_empty() {
        return identifier.key.clone();
    }
    format!(
        "{}:{}",
        identifier.namespace.replace(':', "\\:"),
        identifier.key
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_without_namespace() {
        assert_eq!(make_key_string(&Identifier::local("battery")), "battery");
    }

    #[test]
    fn test_key_with_namespace() {
        let id = Identifier::new("sat", "battery");
        assert_eq!(make_key_string(&id), "sat:battery");
    }

    #[test]
    fn test_key_escapes_namespace_separator() {
        let id = Identifier::new("a:b", "c");
        assert_eq!(NamespacedKeys.make_key_string(&id), "a\\:b:c");
    }

    #[test]
    fn test_datum_source_key() {
        let datum = Datum::for_source("sat:battery", json!({"value": 3.2}));
        assert_eq!(datum.source_key(), Some("sat:battery"));
        assert_eq!(datum.get("value"), Some(&json!(3.2)));
        assert!(Datum::empty().source_key().is_none());
    }

    #[test]
    fn test_datum_from_json() {
        let datum: Datum = serde_json::from_value(json!({"id": "a", "utc": 10})).unwrap();
        assert_eq!(datum.source_key(), Some("a"));
        assert!(Datum::try_from(json!([1, 2])).is_err());
    }

    #[test]
    fn test_telemetry_object_deserialize() {
        let yaml = r#"
identifier:
  namespace: sat
  key: battery
name: Battery Voltage
"#;
        let object: TelemetryObject = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(object.identifier, Identifier::new("sat", "battery"));
        assert_eq!(object.name.as_deref(), Some("Battery Voltage"));
    }
}
