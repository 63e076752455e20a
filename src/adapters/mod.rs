//! Vendor payload adapters
//!
//! This module provides adapters that parse raw vendor JSON payloads into the
//! typed inputs of the alignment pipeline.

mod fitbit;

pub use fitbit::FitbitAdapter;

use crate::error::ComputeError;
use crate::types::{DailyHeartRateSummary, HeartRateSeries, SleepLog};
use serde_json::Value;

/// Trait for vendor payload adapters
///
/// Absent or structurally unusable collections come back empty (or `None`);
/// present but malformed timestamps are errors.
pub trait VendorPayloadAdapter {
    /// Split one fetched sleep response into raw log entries.
    ///
    /// The default accepts a bare array of logs or a single log object.
    fn sleep_log_entries(&self, response: &Value) -> Vec<Value> {
        match response {
            Value::Array(entries) => entries.clone(),
            Value::Object(_) => vec![response.clone()],
            _ => Vec::new(),
        }
    }

    /// Parse raw sleep-log entries, one per night or nap
    fn sleep_logs(&self, raw_logs: &[Value]) -> Result<Vec<SleepLog>, ComputeError>;

    /// Parse an intraday heart-rate response into an anchored series
    fn heart_rate_series(&self, raw: &Value) -> Result<Option<HeartRateSeries>, ComputeError>;

    /// Parse a daily heart-rate summary response
    fn daily_summary(&self, raw: &Value) -> Result<Option<DailyHeartRateSummary>, ComputeError>;
}
