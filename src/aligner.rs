//! Heart-rate series alignment
//!
//! Places the intraday series on the same absolute time axis as the sleep
//! segments, clips it to the query window and smooths it for display.

use crate::error::ComputeError;
use crate::reconstruct::TimeReconstructor;
use crate::types::{HeartRateSeries, SmoothedHeartRate, TimedHeartRate};
use crate::window::TimeWindow;

/// Default smoothing width for per-minute data
pub const DEFAULT_SMOOTHING_WINDOW: usize = 9;

/// Windowing and smoothing over reconstructed heart-rate samples
pub struct SeriesAligner;

impl SeriesAligner {
    /// Reconstruct timestamps and keep the samples inside `window`.
    pub fn align(
        series: &HeartRateSeries,
        window: &TimeWindow,
    ) -> Result<Vec<TimedHeartRate>, ComputeError> {
        let timed = TimeReconstructor::reconstruct_series(series)?;
        let total = timed.len();
        let aligned = Self::filter_to_window(timed, window);
        log::debug!(
            "heart rate samples: {} reconstructed from {}, {} inside window",
            total,
            series.anchor_date,
            aligned.len()
        );
        Ok(aligned)
    }

    /// Keep the samples whose timestamp lies in `[start, end)`.
    pub fn filter_to_window(samples: Vec<TimedHeartRate>, window: &TimeWindow) -> Vec<TimedHeartRate> {
        samples
            .into_iter()
            .filter(|s| window.contains(s.time))
            .collect()
    }

    /// Moving average over `window_size` points.
    ///
    /// Centered: the window spans `window_size / 2` points on each side, so
    /// `window_size` must be odd. Trailing: the window ends at the point.
    /// Positions where the full window does not fit get `None`, never a
    /// partial average.
    pub fn smooth(
        samples: &[TimedHeartRate],
        window_size: usize,
        centered: bool,
    ) -> Result<Vec<SmoothedHeartRate>, ComputeError> {
        validate_smoothing_window(window_size, centered)?;

        let mut prefix = Vec::with_capacity(samples.len() + 1);
        prefix.push(0u64);
        for sample in samples {
            let last = prefix[prefix.len() - 1];
            prefix.push(last + u64::from(sample.value));
        }

        let n = samples.len();
        let half = window_size / 2;
        let smoothed = samples
            .iter()
            .enumerate()
            .map(|(i, sample)| {
                let bounds = if centered {
                    (i >= half && i + half < n).then(|| (i - half, i + half + 1))
                } else {
                    (i + 1 >= window_size).then(|| (i + 1 - window_size, i + 1))
                };
                SmoothedHeartRate {
                    time: sample.time,
                    value: sample.value,
                    smoothed: bounds
                        .map(|(lo, hi)| (prefix[hi] - prefix[lo]) as f64 / window_size as f64),
                }
            })
            .collect();

        Ok(smoothed)
    }
}

pub(crate) fn validate_smoothing_window(window_size: usize, centered: bool) -> Result<(), ComputeError> {
    if window_size == 0 || (centered && window_size % 2 == 0) {
        return Err(ComputeError::InvalidSmoothingWindow {
            size: window_size,
            centered,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::HeartRateSample;
    use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, TimeZone, Utc};

    fn series_from(start: DateTime<Utc>, values: &[u32]) -> Vec<TimedHeartRate> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| TimedHeartRate {
                time: start + TimeDelta::minutes(i as i64),
                value: *v,
            })
            .collect()
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 23, 50, 0).unwrap()
    }

    #[test]
    fn test_nine_point_centered_edges_have_no_value() {
        let values: Vec<u32> = (0..20).map(|i| 50 + i).collect();
        let smoothed = SeriesAligner::smooth(&series_from(start(), &values), 9, true).unwrap();

        assert_eq!(smoothed.len(), 20);
        assert!(smoothed[..4].iter().all(|s| s.smoothed.is_none()));
        assert!(smoothed[16..].iter().all(|s| s.smoothed.is_none()));
        assert!(smoothed[4..16].iter().all(|s| s.smoothed.is_some()));

        // Linear input: the centered mean equals the center value.
        assert_eq!(smoothed[4].smoothed, Some(54.0));
        assert_eq!(smoothed[15].smoothed, Some(65.0));
    }

    #[test]
    fn test_centered_average_values() {
        let smoothed =
            SeriesAligner::smooth(&series_from(start(), &[60, 63, 60, 90, 60]), 3, true).unwrap();
        let values: Vec<Option<f64>> = smoothed.iter().map(|s| s.smoothed).collect();
        assert_eq!(values, vec![None, Some(61.0), Some(71.0), Some(70.0), None]);
        assert_eq!(smoothed[3].value, 90);
    }

    #[test]
    fn test_trailing_average() {
        let smoothed =
            SeriesAligner::smooth(&series_from(start(), &[60, 62, 64, 66]), 2, false).unwrap();
        let values: Vec<Option<f64>> = smoothed.iter().map(|s| s.smoothed).collect();
        assert_eq!(values, vec![None, Some(61.0), Some(63.0), Some(65.0)]);
    }

    #[test]
    fn test_series_shorter_than_window() {
        let smoothed = SeriesAligner::smooth(&series_from(start(), &[60, 61, 62]), 9, true).unwrap();
        assert_eq!(smoothed.len(), 3);
        assert!(smoothed.iter().all(|s| s.smoothed.is_none()));

        assert!(SeriesAligner::smooth(&[], 9, true).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_smoothing_window() {
        let samples = series_from(start(), &[60, 61]);
        assert!(matches!(
            SeriesAligner::smooth(&samples, 0, false),
            Err(ComputeError::InvalidSmoothingWindow { size: 0, .. })
        ));
        assert!(SeriesAligner::smooth(&samples, 4, true).is_err());
        assert!(SeriesAligner::smooth(&samples, 4, false).is_ok());
    }

    #[test]
    fn test_align_reconstructs_then_filters() {
        let series = HeartRateSeries {
            anchor_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            samples: ["22:59:00", "23:00:00", "23:59:00", "00:30:00", "01:00:00"]
                .iter()
                .map(|t| HeartRateSample {
                    time: NaiveTime::parse_from_str(t, "%H:%M:%S").unwrap(),
                    value: 55,
                })
                .collect(),
        };
        let window = TimeWindow::new(
            Utc.with_ymd_and_hms(2024, 1, 15, 23, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 16, 1, 0, 0).unwrap(),
        )
        .unwrap();

        let aligned = SeriesAligner::align(&series, &window).unwrap();
        let times: Vec<String> = aligned.iter().map(|s| s.time.format("%d %H:%M").to_string()).collect();
        assert_eq!(times, vec!["15 23:00", "15 23:59", "16 00:30"]);
    }
}
