//! Core types for the Sleep Flux pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: typed vendor inputs (sleep logs, time-only heart-rate samples,
//! daily summaries), reconstructed series, and the two output projections.

use crate::error::ComputeError;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Sleep stage classification
///
/// Variants are declared in display order, so the derived `Ord` matches
/// `display_rank`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SleepLevel {
    Deep,
    Light,
    Rem,
    Wake,
}

impl SleepLevel {
    pub const ALL: [SleepLevel; 4] = [
        SleepLevel::Deep,
        SleepLevel::Light,
        SleepLevel::Rem,
        SleepLevel::Wake,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SleepLevel::Deep => "deep",
            SleepLevel::Light => "light",
            SleepLevel::Rem => "rem",
            SleepLevel::Wake => "wake",
        }
    }

    /// Map a vendor level label; `None` for labels outside the four stages
    pub fn from_vendor(label: &str) -> Option<Self> {
        match label {
            "deep" => Some(SleepLevel::Deep),
            "light" => Some(SleepLevel::Light),
            "rem" => Some(SleepLevel::Rem),
            "wake" => Some(SleepLevel::Wake),
            _ => None,
        }
    }

    /// Vertical position on a hypnogram: deep=1 .. wake=4
    pub fn display_rank(&self) -> u8 {
        match self {
            SleepLevel::Deep => 1,
            SleepLevel::Light => 2,
            SleepLevel::Rem => 3,
            SleepLevel::Wake => 4,
        }
    }
}

/// One contiguous stage interval within a sleep log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SleepStageSegment {
    pub level: SleepLevel,
    pub start_time: DateTime<Utc>,
    pub duration_seconds: u32,
}

impl SleepStageSegment {
    pub fn new(level: SleepLevel, start_time: DateTime<Utc>, duration_seconds: u32) -> Self {
        Self {
            level,
            start_time,
            duration_seconds,
        }
    }

    /// Create a segment whose end time is representable
    pub fn try_new(
        level: SleepLevel,
        start_time: DateTime<Utc>,
        duration_seconds: u32,
    ) -> Result<Self, ComputeError> {
        let segment = Self::new(level, start_time, duration_seconds);
        segment.checked_end_time().ok_or_else(|| {
            ComputeError::DateOutOfRange(format!(
                "{duration_seconds} seconds after {}",
                start_time.to_rfc3339()
            ))
        })?;
        Ok(segment)
    }

    /// `start_time + duration_seconds`, `None` past the last representable instant
    pub fn checked_end_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
            .checked_add_signed(TimeDelta::seconds(i64::from(self.duration_seconds)))
    }

    /// `start_time + duration_seconds`, saturating at `DateTime::<Utc>::MAX_UTC`
    pub fn end_time(&self) -> DateTime<Utc> {
        self.checked_end_time().unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// One night (or nap) as reported by the vendor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SleepLog {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub stages: Vec<SleepStageSegment>,
}

/// Intraday heart-rate sample carrying only a time of day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartRateSample {
    pub time: NaiveTime,
    pub value: u32,
}

/// Time-only samples plus the date the first of them belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartRateSeries {
    /// First reported date of the owning daily-aggregate resource
    pub anchor_date: NaiveDate,
    pub samples: Vec<HeartRateSample>,
}

/// Heart-rate sample with its reconstructed absolute timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedHeartRate {
    pub time: DateTime<Utc>,
    pub value: u32,
}

/// Heart-rate sample after smoothing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmoothedHeartRate {
    pub time: DateTime<Utc>,
    pub value: u32,
    /// Absent where the smoothing window does not fit (series edges)
    pub smoothed: Option<f64>,
}

/// Resting heart rate for one reported day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyRestingHeartRate {
    pub date: NaiveDate,
    pub resting_heart_rate: Option<u32>,
}

/// Daily heart-rate aggregate resource, in vendor-reported day order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyHeartRateSummary {
    pub days: Vec<DailyRestingHeartRate>,
}

impl DailyHeartRateSummary {
    /// First reported day's value only; never averaged across days.
    pub fn resting_heart_rate(&self) -> Option<u32> {
        self.days.first().and_then(|d| d.resting_heart_rate)
    }
}

/// `[start, end)` bar of a stage trace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartSegment {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// All segments of one stage, in time order, with how the trace is drawn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSeries {
    pub level: SleepLevel,
    pub rank: u8,
    pub label: String,
    pub color: String,
    pub segments: Vec<ChartSegment>,
}

/// Chart-ready projection: per-stage bars plus a smoothed heart-rate trace
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartSeriesOutput {
    /// Ordered by display rank; stages with no segments are omitted
    pub stages: Vec<StageSeries>,
    pub heart_rate: Vec<SmoothedHeartRate>,
    pub heart_rate_color: String,
    pub total_awake_seconds: u64,
}

impl ChartSeriesOutput {
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty() && self.heart_rate.is_empty()
    }
}

/// API projection metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMetadata {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub total_awake_time_minutes: u64,
}

/// Sleep stage entry in the API projection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSleepStage {
    pub level: SleepLevel,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_seconds: u32,
}

impl From<&SleepStageSegment> for ApiSleepStage {
    fn from(segment: &SleepStageSegment) -> Self {
        Self {
            level: segment.level,
            start_time: segment.start_time,
            end_time: segment.end_time(),
            duration_seconds: segment.duration_seconds,
        }
    }
}

/// Heart-rate entry in the API projection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiHeartRate {
    pub time: DateTime<Utc>,
    pub value: u32,
}

impl From<TimedHeartRate> for ApiHeartRate {
    fn from(sample: TimedHeartRate) -> Self {
        Self {
            time: sample.time,
            value: sample.value,
        }
    }
}

/// Flat API projection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPayload {
    pub metadata: ApiMetadata,
    pub sleep_stages: Vec<ApiSleepStage>,
    pub heart_rate: Vec<ApiHeartRate>,
    pub resting_heart_rate: Option<u32>,
}

impl ApiPayload {
    /// Zero-valued payload echoing the query window
    pub fn empty(start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Self {
        Self {
            metadata: ApiMetadata {
                start_time,
                end_time,
                total_awake_time_minutes: 0,
            },
            sleep_stages: Vec::new(),
            heart_rate: Vec::new(),
            resting_heart_rate: None,
        }
    }
}
