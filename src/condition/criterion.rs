// SPDX-License-Identifier: MIT

//! Telemetry criterion
//!
//! A criterion applies one operation to one field of every datum coming from a
//! set of telemetry sources, remembers the boolean outcome per source, and
//! combines those outcomes under its [`Mode`].
//!
//! Two entry points feed it:
//! - [`TelemetryCriterion::get_result`] - the streaming path, one datum at a time.
//!   The aggregate is kept in the criterion.
//! - [`TelemetryCriterion::request_lad`] - the query path. Fetches the latest datum
//!   of every source and returns a result datum stamped with the time-system
//!   values of the last source. Nothing is kept besides the per-source cache.

use futures::future::try_join_all;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::definition::CriterionDefinition;
use super::evaluator::{aggregate, Mode};
use super::notifier::{CriterionEvent, CriterionSnapshot, NotificationSink, CRITERION_UPDATED};
use super::operations::{OperationRegistry, STANDARD_OPERATIONS};
use crate::telemetry::datum::NamespacedKeys;
use crate::telemetry::time::TimeSystemRegistry;
use crate::telemetry::{
    CriterionError, Datum, KeyNormalizer, RequestOptions, Result, SourceMap, TelemetryProvider,
};

/// Last outcome per canonical source key
pub type ResultCache = BTreeMap<String, bool>;

/// Collaborators a criterion consults but never mutates
#[derive(Clone)]
pub struct CriterionContext {
    pub provider: Arc<dyn TelemetryProvider>,
    pub notifier: Arc<dyn NotificationSink>,
    pub keys: Arc<dyn KeyNormalizer>,
    pub operations: Arc<OperationRegistry>,
    pub time_systems: Arc<TimeSystemRegistry>,
}

impl CriterionContext {
    /// Standard operations, UTC and local time systems, namespaced source keys
    pub fn new(provider: Arc<dyn TelemetryProvider>, notifier: Arc<dyn NotificationSink>) -> Self {
        Self {
            provider,
            notifier,
            keys: Arc::new(NamespacedKeys),
            operations: Arc::clone(&STANDARD_OPERATIONS),
            time_systems: Arc::new(TimeSystemRegistry::standard()),
        }
    }

    pub fn with_operations(mut self, operations: Arc<OperationRegistry>) -> Self {
        self.operations = operations;
        self
    }

    pub fn with_time_systems(mut self, time_systems: Arc<TimeSystemRegistry>) -> Self {
        self.time_systems = time_systems;
        self
    }

    pub fn with_keys(mut self, keys: Arc<dyn KeyNormalizer>) -> Self {
        self.keys = keys;
        self
    }
}

/// Aggregate produced by the query path
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultDatum {
    pub result: bool,
    /// Time-system values copied from the triggering datum
    #[serde(flatten)]
    pub time: Map<String, Value>,
}

impl ResultDatum {
    pub fn get(&self, time_system: &str) -> Option<&Value> {
        self.time.get(time_system)
    }
}

/// Response of a latest-value request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LadResult {
    pub id: String,
    pub data: ResultDatum,
}

/// Retires a criterion from outside its owner, e.g. while a request is in flight
#[derive(Debug, Clone)]
pub struct RetireHandle {
    token: CancellationToken,
}

impl RetireHandle {
    pub fn retire(&self) {
        self.token.cancel();
    }

    pub fn is_retired(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the criterion is retired
    pub async fn retired(&self) {
        self.token.cancelled().await
    }

    pub(crate) fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}

#[derive(Debug)]
struct ActiveState {
    sources: SourceMap,
    cache: ResultCache,
    result: Option<bool>,
}

#[derive(Debug)]
enum CriterionState {
    Active(ActiveState),
    Retired,
}

pub struct TelemetryCriterion {
    id: String,
    /// Mode as configured, kept for snapshots when it does not parse
    configured_mode: String,
    mode: Option<Mode>,
    operation: String,
    input: Vec<Value>,
    metadata: String,
    state: CriterionState,
    context: CriterionContext,
    cancel: CancellationToken,
}

impl TelemetryCriterion {
    /// Build a criterion and announce it. An invalid definition is accepted and
    /// produces an inert criterion.
    pub fn new(definition: CriterionDefinition, context: CriterionContext) -> Self {
        let criterion = Self {
            id: definition.id,
            mode: Mode::parse(&definition.mode),
            configured_mode: definition.mode,
            operation: definition.operation,
            input: definition.input,
            metadata: definition.metadata,
            state: CriterionState::Active(ActiveState {
                sources: definition.telemetry_objects,
                cache: ResultCache::new(),
                result: None,
            }),
            context,
            cancel: CancellationToken::new(),
        };

        if !criterion.is_valid() {
            log::warn!(
                "Criterion {} is invalid (mode '{}', operation '{}', field '{}')",
                criterion.id,
                criterion.configured_mode,
                criterion.operation,
                criterion.metadata
            );
        }

        criterion.context.notifier.publish(
            CRITERION_UPDATED,
            CriterionEvent {
                id: criterion.id.clone(),
                data: criterion.snapshot(),
            },
        );
        criterion
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn mode(&self) -> Option<Mode> {
        self.mode
    }

    pub fn is_valid(&self) -> bool {
        self.mode.is_some() && !self.metadata.is_empty() && !self.operation.is_empty()
    }

    pub fn is_retired(&self) -> bool {
        matches!(self.state, CriterionState::Retired) || self.cancel.is_cancelled()
    }

    pub fn retire_handle(&self) -> RetireHandle {
        RetireHandle {
            token: self.cancel.clone(),
        }
    }

    /// Aggregate of the last streaming update; `None` before the first one
    pub fn result(&self) -> Result<Option<bool>> {
        Ok(self.active()?.result)
    }

    pub fn sources(&self) -> Result<&SourceMap> {
        Ok(&self.active()?.sources)
    }

    pub fn cache(&self) -> Result<&ResultCache> {
        Ok(&self.active()?.cache)
    }

    pub fn snapshot(&self) -> CriterionSnapshot {
        let sources = match &self.state {
            CriterionState::Active(state) => state
                .sources
                .values()
                .map(|object| self.context.keys.make_key_string(&object.identifier))
                .collect(),
            CriterionState::Retired => vec![],
        };
        CriterionSnapshot {
            id: self.id.clone(),
            mode: self.configured_mode.clone(),
            operation: self.operation.clone(),
            input: self.input.clone(),
            metadata: self.metadata.clone(),
            sources,
            valid: self.is_valid(),
        }
    }

    /// Replace the known sources. Cached outcomes of sources no longer known
    /// are dropped so they stop influencing the aggregate.
    pub fn update_sources(&mut self, sources: SourceMap) -> Result<()> {
        let keys = self.context.keys.clone();
        let state = self.active_mut()?;

        let known: Vec<String> = sources
            .values()
            .map(|object| keys.make_key_string(&object.identifier))
            .collect();
        state.cache.retain(|key, _| known.contains(key));
        state.sources = sources;
        Ok(())
    }

    /// Outcome of the operation for one datum. Reads no per-source state.
    pub fn compute_result(&self, datum: &Datum) -> Result<bool> {
        self.active()?;
        Ok(self.evaluate(datum))
    }

    /// Fold a datum into the cache and build the aggregate datum for `sources`
    pub fn format_data(&mut self, datum: &Datum, sources: &SourceMap) -> Result<ResultDatum> {
        self.active()?;
        let outcome = self.evaluate(datum);
        let result = self.fold(datum.source_key(), outcome, Some(sources))?;

        let time = self
            .context
            .time_systems
            .get_all_time_systems()
            .iter()
            .filter_map(|system| {
                datum
                    .get(&system.key)
                    .map(|value| (system.key.clone(), value.clone()))
            })
            .collect();

        Ok(ResultDatum { result, time })
    }

    /// Streaming update: fold the datum, recompute and keep the aggregate.
    ///
    /// While the criterion is invalid the datum's source contributes `false`.
    pub fn get_result(&mut self, datum: &Datum, sources: &SourceMap) -> Result<bool> {
        self.active()?;
        let outcome = self.is_valid() && self.evaluate(datum);
        let result = self.fold(datum.source_key(), outcome, Some(sources))?;
        self.set_result(result)
    }

    /// Streaming update against the criterion's own known sources
    pub fn observe(&mut self, datum: &Datum) -> Result<bool> {
        self.active()?;
        let outcome = self.is_valid() && self.evaluate(datum);
        let result = self.fold(datum.source_key(), outcome, None)?;
        self.set_result(result)
    }

    /// Evaluate the latest datum of every source.
    ///
    /// All requests run concurrently; the first failure fails the whole call and
    /// leaves the cache untouched. Responses are folded in source order, the
    /// last one through [`format_data`](Self::format_data) so its time-system
    /// values stamp the result.
    pub async fn request_lad(&mut self, options: RequestOptions) -> Result<LadResult> {
        let sources = match &options.sources {
            Some(sources) => sources.clone(),
            None => self.active()?.sources.clone(),
        };
        self.active()?;
        let options = options.latest_value();

        if !self.is_valid() {
            log::debug!("Criterion {} is invalid, skipping telemetry requests", self.id);
            let data = self.format_data(&Datum::empty(), &sources)?;
            return Ok(LadResult {
                id: self.id.clone(),
                data,
            });
        }

        let provider = self.context.provider.clone();
        let keys = self.context.keys.clone();
        let options = &options;
        let requests = sources.values().map(|object| {
            let provider = provider.clone();
            let keys = keys.clone();
            async move {
                provider
                    .request(object, options)
                    .await
                    .map_err(|e| CriterionError::fetch(keys.make_key_string(&object.identifier), e))
            }
        });

        log::debug!(
            "Criterion {} requesting latest telemetry for {} source(s)",
            self.id,
            sources.len()
        );

        let cancel = self.cancel.clone();
        let responses = tokio::select! {
            _ = cancel.cancelled() => None,
            responses = try_join_all(requests) => Some(responses),
        };

        if cancel.is_cancelled() {
            self.retire();
            return Err(CriterionError::retired(&self.id));
        }
        let Some(responses) = responses else {
            return Err(CriterionError::retired(&self.id));
        };
        let mut latest: Vec<Datum> = responses?
            .into_iter()
            .map(|mut samples| samples.pop().unwrap_or_default())
            .collect();

        let last = latest.pop().unwrap_or_default();
        for datum in &latest {
            let outcome = self.evaluate(datum);
            if let Some(key) = datum.source_key() {
                let key = key.to_string();
                self.active_mut()?.cache.insert(key, outcome);
            }
        }

        let data = self.format_data(&last, &sources)?;
        Ok(LadResult {
            id: self.id.clone(),
            data,
        })
    }

    /// Release sources and cache and cancel in-flight requests. Every later call
    /// fails with [`CriterionError::Retired`].
    pub fn destroy(&mut self) -> Result<()> {
        self.active_mut()?;
        self.retire();
        log::debug!("Criterion {} destroyed", self.id);
        Ok(())
    }

    fn retire(&mut self) {
        self.cancel.cancel();
        self.state = CriterionState::Retired;
    }

    fn active(&self) -> Result<&ActiveState> {
        match &self.state {
            CriterionState::Active(state) if !self.cancel.is_cancelled() => Ok(state),
            _ => Err(CriterionError::retired(&self.id)),
        }
    }

    fn active_mut(&mut self) -> Result<&mut ActiveState> {
        if self.cancel.is_cancelled() {
            self.state = CriterionState::Retired;
        }
        match &mut self.state {
            CriterionState::Active(state) => Ok(state),
            CriterionState::Retired => Err(CriterionError::retired(&self.id)),
        }
    }

    fn evaluate(&self, datum: &Datum) -> bool {
        if datum.is_empty() {
            return false;
        }
        let Some(predicate) = self.context.operations.lookup(&self.operation) else {
            log::debug!(
                "Criterion {}: unknown operation '{}'",
                self.id,
                self.operation
            );
            return false;
        };

        let mut params = Vec::with_capacity(self.input.len() + 1);
        params.push(datum.get(&self.metadata).cloned().unwrap_or(Value::Null));
        params.extend(self.input.iter().cloned());
        predicate(&params)
    }

    /// Record an outcome, backfill missing sources with `false` and aggregate the
    /// whole cache. `None` backfills from the known sources.
    fn fold(
        &mut self,
        source_key: Option<&str>,
        outcome: bool,
        sources: Option<&SourceMap>,
    ) -> Result<bool> {
        // An unparseable mode only reaches here through the invalid paths
        let mode = self.mode.unwrap_or(Mode::All);
        let id = self.id.clone();
        let keys = self.context.keys.clone();
        let ActiveState {
            sources: known,
            cache,
            ..
        } = self.active_mut()?;

        match source_key {
            Some(key) => {
                cache.insert(key.to_string(), outcome);
            }
            None => log::debug!("Criterion {}: datum without source id", id),
        }

        for object in sources.unwrap_or(&*known).values() {
            cache
                .entry(keys.make_key_string(&object.identifier))
                .or_insert(false);
        }

        Ok(aggregate(cache.values().copied(), mode))
    }

    fn set_result(&mut self, result: bool) -> Result<bool> {
        self.active_mut()?.result = Some(result);
        Ok(result)
    }
}

impl Drop for TelemetryCriterion {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
