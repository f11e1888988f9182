// SPDX-License-Identifier: MIT

//! In-memory telemetry provider backed by recorded samples

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::error::Error;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::datum::{make_key_string, Datum, TelemetryObject, SOURCE_FIELD};
use super::provider::{RequestOptions, Strategy, TelemetryProvider};

/// Serves requests from samples recorded per canonical source key
#[derive(Clone, Default)]
pub struct InMemoryTelemetryProvider {
    samples: Arc<RwLock<HashMap<String, Vec<Datum>>>>,
}

impl InMemoryTelemetryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a JSON object of `source key -> [datum, ...]`. Samples without
    /// an id are stamped with their source key.
    pub fn from_json(value: Value) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let mut recorded: HashMap<String, Vec<Datum>> = serde_json::from_value(value)?;
        for (source_key, samples) in recorded.iter_mut() {
            for datum in samples.iter_mut() {
                stamp_source(source_key, datum);
            }
        }
        Ok(Self {
            samples: Arc::new(RwLock::new(recorded)),
        })
    }

    /// Append a sample; the datum is stamped with `source_key` when it has no id
    pub async fn record(&self, source_key: &str, mut datum: Datum) {
        stamp_source(source_key, &mut datum);
        let mut samples = self.samples.write().await;
        samples.entry(source_key.to_string()).or_default().push(datum);
    }
}

fn stamp_source(source_key: &str, datum: &mut Datum) {
    if datum.source_key().is_none() {
        datum.insert(SOURCE_FIELD, Value::String(source_key.to_string()));
    }
}

#[async_trait]
impl TelemetryProvider for InMemoryTelemetryProvider {
    async fn request(
        &self,
        object: &TelemetryObject,
        options: &RequestOptions,
    ) -> Result<Vec<Datum>, Box<dyn Error + Send + Sync>> {
        let key = make_key_string(&object.identifier);
        let samples = self.samples.read().await;
        let Some(recorded) = samples.get(&key) else {
            log::debug!("No recorded telemetry for {}", key);
            return Ok(vec![]);
        };

        // Newest samples always; `latest` defaults to one
        let size = match (options.strategy, options.size) {
            (Some(Strategy::Latest), size) => size.unwrap_or(1),
            (_, Some(size)) => size,
            (_, None) => recorded.len(),
        };
        let selected = recorded[recorded.len().saturating_sub(size)..].to_vec();
        Ok(selected)
    }
}
