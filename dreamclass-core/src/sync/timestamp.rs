//! Sync timestamps.
//!
//! Every applied snapshot is tagged with a `SyncStamp`. Stamps are held as
//! UTC instants with millisecond precision and always rendered in one fixed
//! format (`2026-03-02T09:15:30.120Z`), the same shape browsers produce with
//! `Date.toISOString()`. Ordering is chronological on the parsed instant,
//! so stamps from producers using other offsets still compare correctly.

use chrono::{DateTime, Duration, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SyncStamp(DateTime<Utc>);

impl SyncStamp {
    /// The current wall-clock time.
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    /// Wraps an instant, dropping anything finer than a millisecond.
    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        let truncated = DateTime::from_timestamp_millis(at.timestamp_millis()).unwrap_or(at);
        Self(truncated)
    }

    pub fn from_millis(millis: i64) -> Option<Self> {
        DateTime::from_timestamp_millis(millis).map(Self)
    }

    pub fn as_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }

    /// A stamp for a new write that sorts strictly after `previous`.
    ///
    /// Uses the wall clock unless it has not moved past `previous`, in which
    /// case `previous + 1ms` is returned.
    pub fn next_after(previous: Option<SyncStamp>) -> Self {
        let now = Self::now();
        match previous {
            Some(prev) if now <= prev => Self(prev.0 + Duration::milliseconds(1)),
            _ => now,
        }
    }
}

impl fmt::Display for SyncStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(FORMAT))
    }
}

impl FromStr for SyncStamp {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed = DateTime::parse_from_rfc3339(s.trim())?;
        Ok(Self::from_datetime(parsed.with_timezone(&Utc)))
    }
}

impl Serialize for SyncStamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SyncStamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// Serde helpers for an optional stamp where `null`, a missing field and
/// the empty string all mean "never synced".
pub(crate) mod optional {
    use super::*;

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<SyncStamp>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => s.parse().map(Some).map_err(de::Error::custom),
        }
    }
}
