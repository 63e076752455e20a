//! Upstream data sources
//!
//! The pipeline never talks to the vendor API itself. A `SleepDataSource`
//! hands back raw JSON responses for a window; authentication, transport and
//! retries belong to the implementor.

use crate::error::ComputeError;
use crate::window::TimeWindow;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Fetch capabilities the pipeline needs from the vendor
pub trait SleepDataSource {
    /// Intraday heart rate at one-minute resolution covering `window`.
    fn fetch_intraday_heart_rate(&self, window: &TimeWindow) -> Result<Option<Value>, ComputeError>;

    /// Sleep responses for every calendar date `window` touches.
    fn fetch_sleep_logs(&self, window: &TimeWindow) -> Result<Vec<Value>, ComputeError>;

    /// Daily heart-rate summaries (resting heart rate) for the dates of `window`.
    fn fetch_daily_heart_rate_summary(&self, window: &TimeWindow) -> Result<Option<Value>, ComputeError>;
}

/// Resource path of the intraday heart-rate series for `window`
pub fn intraday_heart_rate_path(window: &TimeWindow) -> String {
    format!(
        "1/user/-/activities/heart/date/{}/{}/1min/time/{}/{}.json",
        window.start.format("%Y-%m-%d"),
        window.end.format("%Y-%m-%d"),
        window.start.format("%H:%M"),
        window.end.format("%H:%M"),
    )
}

/// Resource path of the daily heart-rate summaries for `window`
pub fn daily_heart_rate_path(window: &TimeWindow) -> String {
    format!(
        "1/user/-/activities/heart/date/{}/{}.json",
        window.start.format("%Y-%m-%d"),
        window.end.format("%Y-%m-%d"),
    )
}

/// One sleep resource path per calendar date in `window`
pub fn sleep_log_paths(window: &TimeWindow) -> Vec<String> {
    window
        .dates()
        .into_iter()
        .map(|date| format!("1.2/user/-/sleep/date/{}.json", date.format("%Y-%m-%d")))
        .collect()
}

/// Source backed by previously fetched responses saved as JSON files
///
/// The files are taken as already covering the requested window.
#[derive(Debug, Clone, Default)]
pub struct JsonFileSource {
    pub heart_rate: Option<PathBuf>,
    pub sleep: Vec<PathBuf>,
    pub daily: Option<PathBuf>,
}

impl JsonFileSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_heart_rate(mut self, path: impl Into<PathBuf>) -> Self {
        self.heart_rate = Some(path.into());
        self
    }

    pub fn with_sleep(mut self, path: impl Into<PathBuf>) -> Self {
        self.sleep.push(path.into());
        self
    }

    pub fn with_daily(mut self, path: impl Into<PathBuf>) -> Self {
        self.daily = Some(path.into());
        self
    }
}

fn read_json(path: &Path) -> Result<Value, ComputeError> {
    let contents = fs::read_to_string(path)?;
    let value = serde_json::from_str(&contents)?;
    log::debug!("loaded {}", path.display());
    Ok(value)
}

impl SleepDataSource for JsonFileSource {
    fn fetch_intraday_heart_rate(&self, _window: &TimeWindow) -> Result<Option<Value>, ComputeError> {
        self.heart_rate.as_deref().map(read_json).transpose()
    }

    fn fetch_sleep_logs(&self, _window: &TimeWindow) -> Result<Vec<Value>, ComputeError> {
        self.sleep.iter().map(|path| read_json(path)).collect()
    }

    fn fetch_daily_heart_rate_summary(&self, _window: &TimeWindow) -> Result<Option<Value>, ComputeError> {
        self.daily.as_deref().map(read_json).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn window() -> TimeWindow {
        TimeWindow::new(
            Utc.with_ymd_and_hms(2024, 1, 15, 22, 30, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 16, 6, 45, 0).unwrap(),
        )
        .unwrap()
    }

    fn json_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_resource_paths() {
        let w = window();
        assert_eq!(
            intraday_heart_rate_path(&w),
            "1/user/-/activities/heart/date/2024-01-15/2024-01-16/1min/time/22:30/06:45.json"
        );
        assert_eq!(
            daily_heart_rate_path(&w),
            "1/user/-/activities/heart/date/2024-01-15/2024-01-16.json"
        );
        assert_eq!(
            sleep_log_paths(&w),
            vec![
                "1.2/user/-/sleep/date/2024-01-15.json",
                "1.2/user/-/sleep/date/2024-01-16.json",
            ]
        );
    }

    #[test]
    fn test_file_source_reads_payloads() {
        let hr = json_file(r#"{"activities-heart": []}"#);
        let night1 = json_file(r#"{"sleep": []}"#);
        let night2 = json_file(r#"[{"startTime": "2024-01-16T01:00:00.000"}]"#);

        let source = JsonFileSource::new()
            .with_heart_rate(hr.path())
            .with_sleep(night1.path())
            .with_sleep(night2.path());

        assert!(source.fetch_intraday_heart_rate(&window()).unwrap().is_some());
        assert_eq!(source.fetch_sleep_logs(&window()).unwrap().len(), 2);
        assert!(source
            .fetch_daily_heart_rate_summary(&window())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_file_source_errors() {
        let bad = json_file("{not json");
        let source = JsonFileSource::new().with_daily(bad.path());
        assert!(matches!(
            source.fetch_daily_heart_rate_summary(&window()),
            Err(ComputeError::JsonError(_))
        ));

        let dir = tempfile::tempdir().unwrap();
        let source = JsonFileSource::new().with_heart_rate(dir.path().join("missing.json"));
        assert!(matches!(
            source.fetch_intraday_heart_rate(&window()),
            Err(ComputeError::Io(_))
        ));
    }
}
