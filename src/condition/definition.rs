// SPDX-License-Identifier: MIT

//! Criterion definition schema
//!
//! The shape a host hands to [`TelemetryCriterion::new`](super::criterion::TelemetryCriterion::new),
//! and the shape criterion YAML/JSON files deserialize into.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::telemetry::SourceMap;

/// Full definition of one criterion
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct CriterionDefinition {
    /// Criterion identity; a random one is assigned by the loader when absent
    #[serde(default)]
    pub id: String,
    /// Aggregation mode, `all` or `any`; anything else leaves the criterion invalid
    #[serde(default, alias = "telemetry")]
    pub mode: String,
    /// Operation registry key
    #[serde(default)]
    pub operation: String,
    /// Extra operation parameters, passed after the field value
    #[serde(default)]
    pub input: Vec<Value>,
    /// Datum field the operation reads
    #[serde(default)]
    pub metadata: String,
    /// Initial known sources
    #[serde(default, rename = "telemetryObjects")]
    pub telemetry_objects: SourceMap,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_definition() {
        let yaml = r#"
id: battery-low
mode: all
operation: lessThan
input: [3.3]
metadata: voltage
telemetryObjects:
  battery:
    identifier:
      namespace: sat
      key: battery
"#;
        let def: CriterionDefinition = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(def.id, "battery-low");
        assert_eq!(def.mode, "all");
        assert_eq!(def.operation, "lessThan");
        assert_eq!(def.input, vec![json!(3.3)]);
        assert_eq!(def.metadata, "voltage");
        assert_eq!(def.telemetry_objects.len(), 1);
    }

    #[test]
    fn test_telemetry_alias_for_mode() {
        let def: CriterionDefinition =
            serde_json::from_value(json!({"telemetry": "any", "operation": "isDefined"}))
                .unwrap();
        assert_eq!(def.mode, "any");
        assert!(def.metadata.is_empty());
        assert!(def.telemetry_objects.is_empty());
    }
}
