//! Epoch timestamp decomposition
//!
//! Event times arrive as epoch milliseconds. They are truncated to whole
//! seconds and interpreted in UTC so results never depend on the host zone.

use crate::error::{Error, Result};
use crate::types::TimeEntry;
use chrono::{DateTime, Datelike, Timelike, Utc};

/// Convert epoch milliseconds to a UTC instant truncated to the second
///
/// Truncation rounds toward negative infinity, so pre-1970 instants land on
/// the second they fall in.
pub fn start_time_from_millis(ts: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(ts.div_euclid(1000), 0).ok_or(Error::TimestampRange { ts })
}

/// Decompose an instant into the calendar fields of the time dimension
pub fn decompose(start_time: DateTime<Utc>) -> TimeEntry {
    TimeEntry {
        start_time,
        hour: start_time.hour(),
        day: start_time.day(),
        week: start_time.iso_week().week(),
        month: start_time.month(),
        year: start_time.year(),
        weekday: start_time.weekday().number_from_monday(),
    }
}
