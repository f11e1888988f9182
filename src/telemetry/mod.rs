// SPDX-License-Identifier: MIT

//! Telemetry collaborators
//!
//! Everything a criterion consumes but does not own:
//! - [datum] - samples, source descriptors and canonical source keys
//! - [provider] - the latest-value request interface
//! - [memory] - a provider serving recorded samples
//! - [time] - time systems and their human-facing formats

pub mod datum;
pub mod error;
pub mod memory;
pub mod provider;
pub mod time;

pub use datum::{make_key_string, Datum, Identifier, KeyNormalizer, SourceMap, TelemetryObject};
pub use error::{CriterionError, Result};
pub use provider::{RequestOptions, Strategy, TelemetryProvider};
