//! Pipeline orchestration
//!
//! This module provides the public API for Sleep Flux.
//! It runs raw vendor JSON through the adapter and the aggregator and
//! returns the chart or API projection.

use crate::adapters::{FitbitAdapter, VendorPayloadAdapter};
use crate::aggregator::{AggregatorConfig, SleepHeartRateAggregator};
use crate::chart::{combine_heart_rate_with_stages, CombinedPoint};
use crate::error::ComputeError;
use crate::source::SleepDataSource;
use crate::types::{
    ApiPayload, ChartSeriesOutput, DailyHeartRateSummary, DailyRestingHeartRate, HeartRateSeries,
    SleepLog,
};
use crate::window::TimeWindow;
use chrono::Utc;
use serde_json::Value;

/// Convert raw Fitbit payloads to the API projection JSON.
///
/// # Arguments
/// * `raw_sleep` - Sleep responses, either `{"sleep": [...]}` envelopes or bare log entries
/// * `raw_heart_rate` - Intraday heart-rate response, if fetched
/// * `raw_daily` - Daily heart-rate summary response, if fetched
/// * `window` - Query window
///
/// # Example
/// ```ignore
/// let json = sleep_data_to_api_json(&sleep, Some(&intraday), Some(&daily), &window)?;
/// ```
pub fn sleep_data_to_api_json(
    raw_sleep: &[Value],
    raw_heart_rate: Option<&Value>,
    raw_daily: Option<&Value>,
    window: &TimeWindow,
) -> Result<String, ComputeError> {
    let inputs = ParsedInputs::parse(&FitbitAdapter, raw_sleep, raw_heart_rate, raw_daily)?;
    let payload = SleepHeartRateAggregator::new().build_api_projection(
        &inputs.sleep_logs,
        inputs.heart_rate.as_ref(),
        inputs.daily.as_ref(),
        window,
    )?;
    Ok(serde_json::to_string(&payload)?)
}

/// Convert raw Fitbit payloads to the chart projection JSON.
pub fn sleep_data_to_chart_json(
    raw_sleep: &[Value],
    raw_heart_rate: Option<&Value>,
    window: &TimeWindow,
) -> Result<String, ComputeError> {
    let inputs = ParsedInputs::parse(&FitbitAdapter, raw_sleep, raw_heart_rate, None)?;
    let chart = SleepHeartRateAggregator::new().build_chart_projection(
        &inputs.sleep_logs,
        inputs.heart_rate.as_ref(),
        window,
    )?;
    Ok(serde_json::to_string(&chart)?)
}

/// Typed inputs of one request
struct ParsedInputs {
    sleep_logs: Vec<SleepLog>,
    heart_rate: Option<HeartRateSeries>,
    daily: Option<DailyHeartRateSummary>,
}

impl ParsedInputs {
    fn parse(
        adapter: &dyn VendorPayloadAdapter,
        raw_sleep: &[Value],
        raw_heart_rate: Option<&Value>,
        raw_daily: Option<&Value>,
    ) -> Result<Self, ComputeError> {
        let entries: Vec<Value> = raw_sleep
            .iter()
            .flat_map(|response| adapter.sleep_log_entries(response))
            .collect();
        let sleep_logs = adapter.sleep_logs(&entries)?;

        let heart_rate = match raw_heart_rate {
            Some(raw) => adapter.heart_rate_series(raw)?,
            None => None,
        };
        let daily = match raw_daily {
            Some(raw) => adapter.daily_summary(raw)?,
            None => None,
        };

        log::debug!(
            "parsed {} sleep logs, {} heart rate samples, daily summary: {}",
            sleep_logs.len(),
            heart_rate.as_ref().map_or(0, |s| s.samples.len()),
            daily.is_some()
        );

        Ok(Self {
            sleep_logs,
            heart_rate,
            daily,
        })
    }
}

/// Fetch-then-transform processor over a data source.
///
/// When no window is given, the configured trailing look-back from now is
/// used (23 hours for the chart, 12 hours for the API and 7 days for the
/// resting heart-rate listing by default).
pub struct SleepDataProcessor<S: SleepDataSource> {
    source: S,
    aggregator: SleepHeartRateAggregator,
}

impl<S: SleepDataSource> SleepDataProcessor<S> {
    /// Create a processor with default settings
    pub fn new(source: S) -> Self {
        Self {
            source,
            aggregator: SleepHeartRateAggregator::new(),
        }
    }

    /// Create a processor with validated aggregator settings
    pub fn with_config(source: S, config: AggregatorConfig) -> Result<Self, ComputeError> {
        Ok(Self {
            source,
            aggregator: SleepHeartRateAggregator::with_config(config)?,
        })
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetch and build the API projection
    pub fn api_payload(&self, window: Option<&TimeWindow>) -> Result<ApiPayload, ComputeError> {
        let window = match window {
            Some(w) => *w,
            None => self.aggregator.config().default_api_window(Utc::now())?,
        };
        let inputs = self.fetch(&window, true)?;
        self.aggregator.build_api_projection(
            &inputs.sleep_logs,
            inputs.heart_rate.as_ref(),
            inputs.daily.as_ref(),
            &window,
        )
    }

    /// Fetch and build the chart projection
    pub fn chart_series(&self, window: Option<&TimeWindow>) -> Result<ChartSeriesOutput, ComputeError> {
        let window = match window {
            Some(w) => *w,
            None => self.aggregator.config().default_chart_window(Utc::now())?,
        };
        let inputs = self.fetch(&window, false)?;
        self.aggregator
            .build_chart_projection(&inputs.sleep_logs, inputs.heart_rate.as_ref(), &window)
    }

    /// Heart-rate samples of the API projection annotated with their stage
    pub fn combined_points(&self, window: Option<&TimeWindow>) -> Result<Vec<CombinedPoint>, ComputeError> {
        Ok(combine_heart_rate_with_stages(&self.api_payload(window)?))
    }

    /// Resting heart rate for every day the summary reports
    pub fn resting_heart_rates(
        &self,
        window: Option<&TimeWindow>,
    ) -> Result<Vec<DailyRestingHeartRate>, ComputeError> {
        let window = match window {
            Some(w) => *w,
            None => self.aggregator.config().default_resting_window(Utc::now())?,
        };
        window.validate()?;
        let Some(raw) = self.source.fetch_daily_heart_rate_summary(&window)? else {
            return Ok(Vec::new());
        };
        Ok(FitbitAdapter
            .daily_summary(&raw)?
            .map(|summary| summary.days)
            .unwrap_or_default())
    }

    fn fetch(&self, window: &TimeWindow, with_daily: bool) -> Result<ParsedInputs, ComputeError> {
        window.validate()?;

        let raw_sleep = self.source.fetch_sleep_logs(window)?;
        let raw_heart_rate = self.source.fetch_intraday_heart_rate(window)?;
        let raw_daily = if with_daily {
            self.source.fetch_daily_heart_rate_summary(window)?
        } else {
            None
        };

        ParsedInputs::parse(
            &FitbitAdapter,
            &raw_sleep,
            raw_heart_rate.as_ref(),
            raw_daily.as_ref(),
        )
    }
}
