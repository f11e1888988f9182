//! Human-facing time formats

use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, TimeZone, Utc};
use std::fmt::Display;

pub const LOCAL_FORMAT_KEY: &str = "local-format";
pub const UTC_FORMAT_KEY: &str = "utc";

const LOCAL_PATTERN: &str = "%Y-%m-%d %-I:%M:%S%.3f %P";
const LOCAL_PARSE_PATTERN: &str = "%Y-%m-%d %I:%M:%S%.3f %p";
const UTC_PATTERN: &str = "%Y-%m-%d %H:%M:%S%.3fZ";

/// Converts between UTC milliseconds and text
pub trait TimeFormat {
    fn key(&self) -> &str;

    fn format(&self, millis: i64) -> Option<String>;

    fn parse(&self, text: &str) -> Option<i64>;

    fn validate(&self, text: &str) -> bool {
        self.parse(text).is_some()
    }
}

/// `YYYY-MM-DD h:mm:ss.SSS am`, in a given zone (the machine's by default)
#[derive(Debug, Clone)]
pub struct LocalTimeFormat<Tz: TimeZone = Local> {
    zone: Tz,
}

impl LocalTimeFormat<Local> {
    pub fn new() -> Self {
        Self { zone: Local }
    }
}

impl Default for LocalTimeFormat<Local> {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalTimeFormat<FixedOffset> {
    /// Pin the zone, e.g. for reproducible output
    pub fn with_offset(offset: FixedOffset) -> Self {
        Self { zone: offset }
    }
}

impl<Tz> TimeFormat for LocalTimeFormat<Tz>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    fn key(&self) -> &str {
        LOCAL_FORMAT_KEY
    }

    fn format(&self, millis: i64) -> Option<String> {
        let moment: DateTime<Tz> = self.zone.timestamp_millis_opt(millis).single()?;
        Some(moment.format(LOCAL_PATTERN).to_string())
    }

    fn parse(&self, text: &str) -> Option<i64> {
        let naive = NaiveDateTime::parse_from_str(text.trim(), LOCAL_PARSE_PATTERN).ok()?;
        let moment = self.zone.from_local_datetime(&naive).single()?;
        Some(moment.timestamp_millis())
    }
}

/// `YYYY-MM-DD HH:mm:ss.SSSZ`
#[derive(Debug, Clone, Copy, Default)]
pub struct UtcTimeFormat;

impl TimeFormat for UtcTimeFormat {
    fn key(&self) -> &str {
        UTC_FORMAT_KEY
    }

    fn format(&self, millis: i64) -> Option<String> {
        let moment = Utc.timestamp_millis_opt(millis).single()?;
        Some(moment.format(UTC_PATTERN).to_string())
    }

    fn parse(&self, text: &str) -> Option<i64> {
        let naive = NaiveDateTime::parse_from_str(text.trim(), UTC_PATTERN).ok()?;
        Some(naive.and_utc().timestamp_millis())
    }
}
