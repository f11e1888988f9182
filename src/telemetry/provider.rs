use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::error::Error;

use super::datum::{Datum, SourceMap, TelemetryObject};

/// How a historical request selects samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Only the most recent samples
    Latest,
    /// Everything in the requested bounds
    Minmax,
}

/// Options for a telemetry request
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RequestOptions {
    /// Sources to evaluate; the criterion's known sources when absent
    #[serde(
        default,
        rename = "telemetryObjects",
        skip_serializing_if = "Option::is_none"
    )]
    pub sources: Option<SourceMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<Strategy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Provider-specific options passed through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RequestOptions {
    pub fn with_sources(mut self, sources: SourceMap) -> Self {
        self.sources = Some(sources);
        self
    }

    /// Overlay the "most recent single value" profile
    pub fn latest_value(mut self) -> Self {
        self.strategy = Some(Strategy::Latest);
        self.size = Some(1);
        self
    }
}

/// Answers historical ("latest value") telemetry requests.
///
/// Implementations return samples oldest first; callers only look at the last one.
#[async_trait]
pub trait TelemetryProvider: Send + Sync {
    async fn request(
        &self,
        object: &TelemetryObject,
        options: &RequestOptions,
    ) -> Result<Vec<Datum>, Box<dyn Error + Send + Sync>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_latest_value_overrides() {
        let options = RequestOptions {
            strategy: Some(Strategy::Minmax),
            size: Some(50),
            domain: Some("utc".to_string()),
            ..Default::default()
        }
        .latest_value();

        assert_eq!(options.strategy, Some(Strategy::Latest));
        assert_eq!(options.size, Some(1));
        assert_eq!(options.domain.as_deref(), Some("utc"));
    }

    #[test]
    fn test_options_keep_extra_fields() {
        let options: RequestOptions =
            serde_json::from_value(json!({"size": 3, "priority": "high"})).unwrap();
        assert_eq!(options.size, Some(3));
        assert_eq!(options.extra.get("priority"), Some(&json!("high")));
        assert!(options.sources.is_none());
    }
}
