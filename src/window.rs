//! Query windows
//!
//! A `TimeWindow` is the caller-supplied `[start, end)` range every output is
//! clipped to. Downstream interval math assumes `start <= end`, so invalid
//! windows are rejected rather than normalized.

use crate::error::ComputeError;
use crate::timestamps::parse_timestamp;
use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Half-open time range `[start, end)` in UTC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Create a window, rejecting `start > end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, ComputeError> {
        let window = Self { start, end };
        window.validate()?;
        Ok(window)
    }

    /// The `hours` leading up to `now`.
    pub fn trailing(now: DateTime<Utc>, hours: i64) -> Result<Self, ComputeError> {
        let start = TimeDelta::try_hours(hours)
            .and_then(|span| now.checked_sub_signed(span))
            .ok_or_else(|| {
                ComputeError::DateOutOfRange(format!("{hours} hours before {}", now.to_rfc3339()))
            })?;
        Self::new(start, now)
    }

    /// Parse caller-supplied bounds such as `2024-01-15T22:00` or
    /// `2024-01-15T22:00:00.000+0000`.
    pub fn parse(start: &str, end: &str) -> Result<Self, ComputeError> {
        Self::new(parse_timestamp("start", start)?, parse_timestamp("end", end)?)
    }

    pub fn validate(&self) -> Result<(), ComputeError> {
        if self.start > self.end {
            return Err(ComputeError::InvalidWindow {
                start: self.start.to_rfc3339(),
                end: self.end.to_rfc3339(),
            });
        }
        Ok(())
    }

    /// Whether `t` falls inside `[start, end)`.
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        t >= self.start && t < self.end
    }

    /// Strict overlap test: `start < window.end && end > window.start`.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start < self.end && end > self.start
    }

    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }

    /// Every calendar date the window touches, inclusive of both ends.
    pub fn dates(&self) -> Vec<NaiveDate> {
        let last = self.end.date_naive();
        self.start
            .date_naive()
            .iter_days()
            .take_while(|d| *d <= last)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(d: u32, h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, h, m, 0).unwrap()
    }

    #[test]
    fn test_rejects_inverted_window() {
        let err = TimeWindow::new(at(16, 1, 0), at(15, 23, 0)).unwrap_err();
        assert!(matches!(err, ComputeError::InvalidWindow { .. }));
        assert!(err.to_string().contains("is after"));
    }

    #[test]
    fn test_empty_window_is_valid_and_contains_nothing() {
        let w = TimeWindow::new(at(15, 23, 0), at(15, 23, 0)).unwrap();
        assert!(!w.contains(at(15, 23, 0)));
        assert_eq!(w.duration(), TimeDelta::zero());
    }

    #[test]
    fn test_contains_is_half_open() {
        let w = TimeWindow::new(at(15, 23, 0), at(16, 1, 0)).unwrap();
        assert!(w.contains(at(15, 23, 0)));
        assert!(w.contains(at(16, 0, 59)));
        assert!(!w.contains(at(16, 1, 0)));
        assert!(!w.contains(at(15, 22, 59)));
    }

    #[test]
    fn test_overlaps_is_strict() {
        let w = TimeWindow::new(at(15, 23, 0), at(16, 1, 0)).unwrap();
        assert!(w.overlaps(at(15, 22, 0), at(15, 23, 1)));
        assert!(!w.overlaps(at(15, 22, 0), at(15, 23, 0)));
        assert!(!w.overlaps(at(16, 1, 0), at(16, 2, 0)));
        assert!(w.overlaps(at(15, 22, 0), at(16, 6, 0)));
    }

    #[test]
    fn test_trailing_window() {
        let now = at(16, 6, 0);
        let w = TimeWindow::trailing(now, 23).unwrap();
        assert_eq!(w.start, at(15, 7, 0));
        assert_eq!(w.end, now);
        assert_eq!(w.duration(), TimeDelta::hours(23));

        assert!(TimeWindow::trailing(now, -1).is_err());
    }

    #[test]
    fn test_parse_window() {
        let w = TimeWindow::parse("2024-01-15T23:00", "2024-01-16T01:00:00.000+0000").unwrap();
        assert_eq!(w.start, at(15, 23, 0));
        assert_eq!(w.end, at(16, 1, 0));

        assert!(TimeWindow::parse("2024-01-16T01:00", "2024-01-15T23:00").is_err());
        assert!(TimeWindow::parse("yesterday", "2024-01-15T23:00").is_err());
    }

    #[test]
    fn test_dates_spanned() {
        let w = TimeWindow::new(at(14, 22, 0), at(16, 1, 0)).unwrap();
        let dates: Vec<String> = w.dates().iter().map(|d| d.to_string()).collect();
        assert_eq!(dates, vec!["2024-01-14", "2024-01-15", "2024-01-16"]);
    }
}
