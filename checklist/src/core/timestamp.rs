//! Canonical timestamps and the normalization applied at the parser boundary.
//!
//! Snapshot exports are not consistent about timestamp shape: some carry
//! seconds, some stop at minutes, some append a UTC offset. Everything is
//! funnelled through [`normalize_timestamp`] so later stages only ever see a
//! [`Timestamp`].

use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A point in time together with the UTC offset it was recorded at.
///
/// Reports display the wall-clock time at that offset, so the offset is kept
/// rather than converting everything to UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<FixedOffset>);

impl Timestamp {
    pub fn as_datetime(&self) -> &DateTime<FixedOffset> {
        &self.0
    }

    /// Wall-clock time of day, `HH:MM:SS`.
    pub fn clock(&self) -> String {
        self.0.format("%H:%M:%S").to_string()
    }

    /// Compact sortable form, `YYYYMMDDHHMMSS`.
    pub fn compact(&self) -> String {
        self.0.format("%Y%m%d%H%M%S").to_string()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimestampError {
    #[error("unrecognized timestamp '{0}'")]
    Unrecognized(String),
    #[error("timestamp '{0}' is out of range")]
    OutOfRange(String),
}

static TIMESTAMP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(\d{4})-(\d{2})-(\d{2})[T ](\d{2}):(\d{2})(?::(\d{2})(?:\.(\d{1,9}))?)?\s*(Z|z|[+-]\d{2}:?\d{2})?$",
    )
    .expect("timestamp pattern should compile")
});

/// Normalize a raw snapshot timestamp.
///
/// Accepted shapes:
/// - `YYYY-MM-DDTHH:MM` or `YYYY-MM-DD HH:MM`
/// - `YYYY-MM-DDTHH:MM:SS`, optionally with fractional seconds
/// - any of the above followed by `Z`, `+HH:MM`, `-HH:MM` or `+HHMM`
///
/// Inputs without an offset are read as UTC.
pub(crate) fn normalize_timestamp(raw: &str) -> Result<Timestamp, TimestampError> {
    let caps = TIMESTAMP_RE
        .captures(raw.trim())
        .ok_or_else(|| TimestampError::Unrecognized(raw.to_string()))?;

    let seconds = caps.get(6).map_or("00", |m| m.as_str());
    let fraction = caps
        .get(7)
        .map(|m| format!(".{}", m.as_str()))
        .unwrap_or_default();
    let offset = caps.get(8).map_or("+00:00", |m| m.as_str());
    let canonical = format!(
        "{}-{}-{}T{}:{}:{seconds}{fraction}{offset}",
        &caps[1], &caps[2], &caps[3], &caps[4], &caps[5]
    );

    DateTime::parse_from_str(&canonical, "%Y-%m-%dT%H:%M:%S%.f%#z")
        .map(Timestamp)
        .map_err(|_| TimestampError::OutOfRange(raw.to_string()))
}
