// SPDX-License-Identifier: MIT

//! Time systems
//!
//! A time system is one axis telemetry can be stamped with. Criteria copy the
//! value of every registered time-system key from the triggering datum into
//! their result, so the registry decides which fields survive evaluation.

mod format;

pub use format::{LocalTimeFormat, TimeFormat, UtcTimeFormat, LOCAL_FORMAT_KEY, UTC_FORMAT_KEY};

use serde::{Deserialize, Serialize};

pub const LOCAL_SYSTEM_KEY: &str = "local";
pub const UTC_SYSTEM_KEY: &str = "utc";

/// A registered time axis
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSystem {
    pub key: String,
    pub name: String,
    pub css_class: String,
    /// Key of the format used to render values on this axis
    pub time_format: String,
    pub duration_format: String,
    #[serde(rename = "isUTCBased")]
    pub is_utc_based: bool,
}

impl TimeSystem {
    /// Local wall-clock time, stored as UTC milliseconds
    pub fn local() -> Self {
        Self {
            key: LOCAL_SYSTEM_KEY.to_string(),
            name: "Local".to_string(),
            css_class: "icon-clock".to_string(),
            time_format: LOCAL_FORMAT_KEY.to_string(),
            duration_format: "duration".to_string(),
            is_utc_based: true,
        }
    }

    pub fn utc() -> Self {
        Self {
            key: UTC_SYSTEM_KEY.to_string(),
            name: "UTC".to_string(),
            css_class: "icon-clock".to_string(),
            time_format: UTC_FORMAT_KEY.to_string(),
            duration_format: "duration".to_string(),
            is_utc_based: true,
        }
    }
}

/// Read-only list of time systems, shared by every criterion
#[derive(Debug, Clone, Default)]
pub struct TimeSystemRegistry {
    systems: Vec<TimeSystem>,
}

impl TimeSystemRegistry {
    pub fn new(systems: Vec<TimeSystem>) -> Self {
        Self { systems }
    }

    /// UTC and local time
    pub fn standard() -> Self {
        Self::new(vec![TimeSystem::utc(), TimeSystem::local()])
    }

    pub fn get_all_time_systems(&self) -> &[TimeSystem] {
        &self.systems
    }

    pub fn get(&self, key: &str) -> Option<&TimeSystem> {
        self.systems.iter().find(|system| system.key == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.systems.iter().map(|system| system.key.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_system_metadata() {
        let system = TimeSystem::local();
        assert_eq!(system.key, "local");
        assert_eq!(system.time_format, "local-format");
        assert!(system.is_utc_based);
        assert!(!system.name.is_empty());
        assert!(!system.css_class.is_empty());
        assert!(!system.duration_format.is_empty());
    }

    #[test]
    fn test_standard_registry_keys() {
        let registry = TimeSystemRegistry::standard();
        let keys: Vec<&str> = registry.keys().collect();
        assert_eq!(keys, vec!["utc", "local"]);
        assert!(registry.get("local").is_some());
        assert!(registry.get("tai").is_none());
    }

    #[test]
    fn test_serialize_uses_wire_names() {
        let json = serde_json::to_value(TimeSystem::utc()).unwrap();
        assert_eq!(json["timeFormat"], "utc");
        assert_eq!(json["isUTCBased"], true);
    }
}
