//! Timestamp reconstruction
//!
//! Intraday samples arrive as bare times of day in chronological order. The
//! date is recovered by walking the sequence from an anchor date and moving
//! to the next day whenever the time of day goes backwards.

use crate::error::ComputeError;
use crate::types::{HeartRateSample, HeartRateSeries, TimedHeartRate};
use chrono::{Days, NaiveDate, NaiveTime};

/// Rebuilds absolute timestamps from time-of-day samples
pub struct TimeReconstructor;

impl TimeReconstructor {
    /// Reconstruct every sample of `series` against its anchor date.
    pub fn reconstruct_series(series: &HeartRateSeries) -> Result<Vec<TimedHeartRate>, ComputeError> {
        Self::reconstruct(series.anchor_date, &series.samples)
    }

    /// Combine each sample with a running date that starts at `anchor` and
    /// advances by one day when a time of day is strictly less than the
    /// previous one. Equal consecutive times stay on the same day.
    ///
    /// A single backwards step is a single day: gaps longer than 24 hours
    /// cannot be seen in time-of-day data and are not recovered.
    pub fn reconstruct(
        anchor: NaiveDate,
        samples: &[HeartRateSample],
    ) -> Result<Vec<TimedHeartRate>, ComputeError> {
        let mut current_date = anchor;
        let mut previous: Option<NaiveTime> = None;
        let mut timed = Vec::with_capacity(samples.len());

        for sample in samples {
            if previous.is_some_and(|prev| sample.time < prev) {
                current_date = current_date.checked_add_days(Days::new(1)).ok_or_else(|| {
                    ComputeError::DateOutOfRange(format!("day after {current_date}"))
                })?;
            }
            timed.push(TimedHeartRate {
                time: current_date.and_time(sample.time).and_utc(),
                value: sample.value,
            });
            previous = Some(sample.time);
        }

        Ok(timed)
    }
}
