//! Sleep and heart-rate aggregation
//!
//! Runs the shared filtering pipeline (segments via `IntervalSet`, heart rate
//! via `SeriesAligner`) and shapes the result into either the chart
//! projection or the flat API projection.

use crate::aligner::{validate_smoothing_window, SeriesAligner, DEFAULT_SMOOTHING_WINDOW};
use crate::chart::{stage_display, HEART_RATE_COLOR};
use crate::error::ComputeError;
use crate::intervals::IntervalSet;
use crate::types::{
    ApiHeartRate, ApiMetadata, ApiPayload, ApiSleepStage, ChartSegment, ChartSeriesOutput,
    DailyHeartRateSummary, HeartRateSeries, SleepLevel, SleepLog, StageSeries, TimedHeartRate,
};
use crate::window::TimeWindow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default look-back for the chart projection when no window is given
pub const DEFAULT_CHART_LOOKBACK_HOURS: i64 = 23;

/// Default look-back for the API projection when no window is given
pub const DEFAULT_API_LOOKBACK_HOURS: i64 = 12;

/// Default look-back for the per-day resting heart-rate listing
pub const DEFAULT_RESTING_LOOKBACK_DAYS: i64 = 7;

/// Aggregator settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Points in the heart-rate moving average
    pub smoothing_window: usize,
    /// Center the moving average on each point (otherwise trailing)
    pub centered: bool,
    pub chart_lookback_hours: i64,
    pub api_lookback_hours: i64,
    pub resting_lookback_days: i64,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            smoothing_window: DEFAULT_SMOOTHING_WINDOW,
            centered: true,
            chart_lookback_hours: DEFAULT_CHART_LOOKBACK_HOURS,
            api_lookback_hours: DEFAULT_API_LOOKBACK_HOURS,
            resting_lookback_days: DEFAULT_RESTING_LOOKBACK_DAYS,
        }
    }
}

impl AggregatorConfig {
    pub fn validate(&self) -> Result<(), ComputeError> {
        validate_smoothing_window(self.smoothing_window, self.centered)?;
        for hours in [self.chart_lookback_hours, self.api_lookback_hours] {
            if hours < 0 {
                return Err(ComputeError::DateOutOfRange(format!(
                    "negative look-back of {hours} hours"
                )));
            }
        }
        if self.resting_lookback_days < 0 {
            return Err(ComputeError::DateOutOfRange(format!(
                "negative look-back of {} days",
                self.resting_lookback_days
            )));
        }
        Ok(())
    }

    /// Window used by the chart projection when the caller supplies none.
    pub fn default_chart_window(&self, now: DateTime<Utc>) -> Result<TimeWindow, ComputeError> {
        TimeWindow::trailing(now, self.chart_lookback_hours)
    }

    /// Window used by the API projection when the caller supplies none.
    pub fn default_api_window(&self, now: DateTime<Utc>) -> Result<TimeWindow, ComputeError> {
        TimeWindow::trailing(now, self.api_lookback_hours)
    }

    /// Window used by the resting heart-rate listing when the caller supplies none.
    pub fn default_resting_window(&self, now: DateTime<Utc>) -> Result<TimeWindow, ComputeError> {
        let hours = self.resting_lookback_days.checked_mul(24).ok_or_else(|| {
            ComputeError::DateOutOfRange(format!("{} days", self.resting_lookback_days))
        })?;
        TimeWindow::trailing(now, hours)
    }
}

/// Builds chart and API projections from already-fetched inputs
///
/// Stateless between calls; one instance can serve any number of requests.
#[derive(Debug, Clone, Default)]
pub struct SleepHeartRateAggregator {
    config: AggregatorConfig,
}

/// Output of the shared filtering steps
struct Filtered {
    segments: IntervalSet,
    heart_rate: Vec<TimedHeartRate>,
}

impl SleepHeartRateAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an aggregator with validated settings
    pub fn with_config(config: AggregatorConfig) -> Result<Self, ComputeError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Per-stage segment bars plus the smoothed heart-rate trace.
    ///
    /// Returns an empty output when no sleep segment overlaps `window`.
    pub fn build_chart_projection(
        &self,
        sleep_logs: &[SleepLog],
        heart_rate: Option<&HeartRateSeries>,
        window: &TimeWindow,
    ) -> Result<ChartSeriesOutput, ComputeError> {
        window.validate()?;

        let Some(filtered) = self.filter(sleep_logs, heart_rate, window)? else {
            return Ok(ChartSeriesOutput {
                heart_rate_color: HEART_RATE_COLOR.to_string(),
                ..Default::default()
            });
        };

        let stages = filtered
            .segments
            .group_by_level()
            .into_iter()
            .map(|(level, members)| {
                let display = stage_display(level);
                StageSeries {
                    level,
                    rank: display.rank,
                    label: display.label.to_string(),
                    color: display.color.to_string(),
                    segments: members
                        .into_iter()
                        .map(|s| ChartSegment {
                            start: s.start_time,
                            end: s.end_time(),
                        })
                        .collect(),
                }
            })
            .collect();

        let heart_rate = SeriesAligner::smooth(
            &filtered.heart_rate,
            self.config.smoothing_window,
            self.config.centered,
        )?;

        Ok(ChartSeriesOutput {
            stages,
            heart_rate,
            heart_rate_color: HEART_RATE_COLOR.to_string(),
            total_awake_seconds: filtered.segments.sum_by_level(SleepLevel::Wake),
        })
    }

    /// Flat projection with window metadata, total awake minutes and the
    /// first reported day's resting heart rate.
    ///
    /// Returns a zero-valued payload when no sleep segment overlaps `window`.
    pub fn build_api_projection(
        &self,
        sleep_logs: &[SleepLog],
        heart_rate: Option<&HeartRateSeries>,
        daily_summary: Option<&DailyHeartRateSummary>,
        window: &TimeWindow,
    ) -> Result<ApiPayload, ComputeError> {
        window.validate()?;

        let Some(filtered) = self.filter(sleep_logs, heart_rate, window)? else {
            return Ok(ApiPayload::empty(window.start, window.end));
        };

        let awake_seconds = filtered.segments.sum_by_level(SleepLevel::Wake);

        Ok(ApiPayload {
            metadata: ApiMetadata {
                start_time: window.start,
                end_time: window.end,
                total_awake_time_minutes: seconds_to_rounded_minutes(awake_seconds),
            },
            sleep_stages: filtered
                .segments
                .segments()
                .iter()
                .map(ApiSleepStage::from)
                .collect(),
            heart_rate: filtered
                .heart_rate
                .into_iter()
                .map(ApiHeartRate::from)
                .collect(),
            resting_heart_rate: daily_summary.and_then(DailyHeartRateSummary::resting_heart_rate),
        })
    }

    /// Steps shared by both projections; `None` when no segment survives.
    fn filter(
        &self,
        sleep_logs: &[SleepLog],
        heart_rate: Option<&HeartRateSeries>,
        window: &TimeWindow,
    ) -> Result<Option<Filtered>, ComputeError> {
        let segments = IntervalSet::in_window(sleep_logs, window);
        if segments.is_empty() {
            log::debug!("no sleep segments inside window, returning empty projection");
            return Ok(None);
        }

        let heart_rate = match heart_rate {
            Some(series) => SeriesAligner::align(series, window)?,
            None => Vec::new(),
        };

        Ok(Some(Filtered {
            segments,
            heart_rate,
        }))
    }
}

/// Seconds to whole minutes, halves rounded to even.
fn seconds_to_rounded_minutes(seconds: u64) -> u64 {
    let minutes = seconds / 60;
    let remainder = seconds % 60;
    match remainder.cmp(&30) {
        std::cmp::Ordering::Less => minutes,
        std::cmp::Ordering::Greater => minutes + 1,
        std::cmp::Ordering::Equal => minutes + minutes % 2,
    }
}
