//! Sleep stage interval handling
//!
//! Sleep arrives per night; a query window may cover part of one night or
//! parts of two. Logs are merged into one ordered segment list and windowed
//! at segment granularity, so a log that only partially overlaps the window
//! does not drag in stages that lie entirely outside it.

use crate::types::{SleepLevel, SleepLog, SleepStageSegment};
use crate::window::TimeWindow;

/// Ordered set of sleep stage segments
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntervalSet {
    segments: Vec<SleepStageSegment>,
}

impl IntervalSet {
    /// Concatenate the segments of all `logs` and order them by start time.
    ///
    /// The sort is stable, so segments sharing a start time keep vendor order.
    pub fn merge<'a, I>(logs: I) -> Self
    where
        I: IntoIterator<Item = &'a SleepLog>,
    {
        let mut segments: Vec<SleepStageSegment> = logs
            .into_iter()
            .flat_map(|log| log.stages.iter().cloned())
            .collect();
        segments.sort_by_key(|s| s.start_time);
        Self { segments }
    }

    /// Logs whose `[start_time, end_time)` strictly overlaps `window`.
    pub fn logs_overlapping<'a>(
        logs: &'a [SleepLog],
        window: &'a TimeWindow,
    ) -> impl Iterator<Item = &'a SleepLog> + 'a {
        logs.iter()
            .filter(move |log| window.overlaps(log.start_time, log.end_time))
    }

    /// Keep the segments that overlap `window`. Segments are kept whole,
    /// never clipped to the window edges.
    pub fn filter_overlapping(self, window: &TimeWindow) -> Self {
        let segments = self
            .segments
            .into_iter()
            .filter(|s| window.overlaps(s.start_time, s.end_time()))
            .collect();
        Self { segments }
    }

    /// Log-level filter, merge, then segment-level filter.
    pub fn in_window(logs: &[SleepLog], window: &TimeWindow) -> Self {
        let merged = Self::merge(Self::logs_overlapping(logs, window));
        let before = merged.len();
        let filtered = merged.filter_overlapping(window);
        log::debug!(
            "sleep segments: {} merged, {} inside window",
            before,
            filtered.len()
        );
        filtered
    }

    pub fn segments(&self) -> &[SleepStageSegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Total seconds spent in `level`.
    pub fn sum_by_level(&self, level: SleepLevel) -> u64 {
        self.segments
            .iter()
            .filter(|s| s.level == level)
            .map(|s| u64::from(s.duration_seconds))
            .sum()
    }

    /// Segments grouped by stage, groups in display-rank order, segments in
    /// time order. Stages without segments are omitted.
    pub fn group_by_level(&self) -> Vec<(SleepLevel, Vec<&SleepStageSegment>)> {
        SleepLevel::ALL
            .iter()
            .map(|level| {
                let members: Vec<&SleepStageSegment> =
                    self.segments.iter().filter(|s| s.level == *level).collect();
                (*level, members)
            })
            .filter(|(_, members)| !members.is_empty())
            .collect()
    }
}
