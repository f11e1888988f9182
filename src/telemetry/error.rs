// SPDX-License-Identifier: MIT

//! Typed error handling for condition-rs
//!
//! Configuration and data problems never surface here: an invalid criterion or an
//! empty datum degrades to `false`. Only teardown misuse, transport failures and
//! loading problems become errors.

use thiserror::Error;

/// Top-level error type for condition-rs
#[derive(Debug, Error)]
pub enum CriterionError {
    /// The criterion was destroyed; it accepts no further calls
    #[error("Criterion '{id}' has been retired")]
    Retired { id: String },

    /// A latest-value request failed for one of the sources
    #[error("Telemetry request for source '{source_key}' failed: {source}")]
    Fetch {
        source_key: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Bad configuration, e.g. an unusable environment setting
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl CriterionError {
    /// Create a retired-instance error
    pub fn retired(id: impl Into<String>) -> Self {
        Self::Retired { id: id.into() }
    }

    /// Create a fetch error for a source
    pub fn fetch(
        source_key: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Fetch {
            source_key: source_key.into(),
            source,
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// True when the error comes from a retired criterion
    pub fn is_retired(&self) -> bool {
        matches!(self, Self::Retired { .. })
    }
}

pub type Result<T> = std::result::Result<T, CriterionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retired_display() {
        let err = CriterionError::retired("crit-1");
        assert_eq!(err.to_string(), "Criterion 'crit-1' has been retired");
        assert!(err.is_retired());
    }

    #[test]
    fn test_fetch_keeps_source() {
        let err = CriterionError::fetch("sat:battery", "link down".into());
        assert!(err.to_string().contains("sat:battery"));
        assert!(err.to_string().contains("link down"));
        assert!(std::error::Error::source(&err).is_some());
        assert!(!err.is_retired());
    }

    #[test]
    fn test_config_display() {
        let err = CriterionError::config("offset out of range");
        assert_eq!(err.to_string(), "Configuration error: offset out of range");
        assert!(!err.is_retired());
    }
}
