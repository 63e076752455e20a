//! Vendor timestamp parsing
//!
//! Vendor payloads mix three shapes: full timestamps (usually wall-clock
//! without an offset), bare times of day for intraday samples, and calendar
//! dates for daily aggregates. Naive timestamps are read as UTC.

use crate::error::ComputeError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

const OFFSET_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%z";
const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];
const TIME_OF_DAY_FORMATS: [&str; 2] = ["%H:%M:%S", "%H:%M"];

/// Parse a timestamp, attaching `field` to the error for the caller's logs.
pub fn parse_timestamp(field: &'static str, value: &str) -> Result<DateTime<Utc>, ComputeError> {
    let trimmed = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(trimmed, OFFSET_FORMAT) {
        return Ok(dt.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| ComputeError::timestamp(field, value))
}

/// Parse an `HH:MM:SS` (or `HH:MM`) time of day.
pub fn parse_time_of_day(field: &'static str, value: &str) -> Result<NaiveTime, ComputeError> {
    let trimmed = value.trim();
    TIME_OF_DAY_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| ComputeError::timestamp(field, value))
}

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, ComputeError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| ComputeError::timestamp(field, value))
}
