// SPDX-License-Identifier: MIT

//! Criterion evaluation
//!
//! A criterion checks one operation, such as `value greaterThan 10`, across a
//! set of telemetry sources and combines the per-source outcomes with
//! `all` or `any` logic.

pub mod criterion;
pub mod definition;
pub mod evaluator;
pub mod loader;
pub mod notifier;
pub mod operations;
pub mod stream;

pub use criterion::{
    CriterionContext, LadResult, ResultCache, ResultDatum, RetireHandle, TelemetryCriterion,
};
pub use definition::CriterionDefinition;
pub use evaluator::{aggregate, Mode};
pub use loader::CriterionLoader;
pub use notifier::{
    ChannelSink, CriterionEvent, CriterionSnapshot, LogSink, NotificationSink, CRITERION_UPDATED,
};
pub use operations::{Operation, OperationRegistry, Predicate, STANDARD_OPERATIONS};
pub use stream::subscribe;
