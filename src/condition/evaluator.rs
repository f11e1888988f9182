//! Result aggregation under all/any semantics

use serde::{Deserialize, Serialize};
use std::fmt;

/// How per-source outcomes combine into one result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Every source must satisfy the operation
    All,
    /// At least one source must satisfy the operation
    Any,
}

impl Mode {
    /// Parse a configured mode; anything but `all` / `any` is rejected
    pub fn parse(value: &str) -> Option<Mode> {
        match value {
            "all" => Some(Mode::All),
            "any" => Some(Mode::Any),
            _ => None,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::All => write!(f, "all"),
            Mode::Any => write!(f, "any"),
        }
    }
}

/// Combine per-source results. An empty input is vacuously true under `All`
/// and false under `Any`.
pub fn aggregate<I>(results: I, mode: Mode) -> bool
where
    I: IntoIterator<Item = bool>,
{
    let mut results = results.into_iter();
    match mode {
        Mode::All => results.all(|r| r),
        Mode::Any => results.any(|r| r),
    }
}
