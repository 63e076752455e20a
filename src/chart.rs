//! Chart presentation helpers
//!
//! Stage rank, label and colour are a presentation lookup, not part of the
//! data model. This module also merges the API projection into one point per
//! heart-rate sample, the shape a combined hypnogram/heart-rate chart plots.

use crate::types::{ApiPayload, SleepLevel};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Colour of the heart-rate trace
pub const HEART_RATE_COLOR: &str = "rgba(219, 86, 86, 0.9)";

/// How a stage is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StageDisplay {
    pub level: SleepLevel,
    pub rank: u8,
    pub label: &'static str,
    pub color: &'static str,
}

/// Display table in axis order (deep at the bottom)
pub const STAGE_DISPLAY: [StageDisplay; 4] = [
    StageDisplay {
        level: SleepLevel::Deep,
        rank: 1,
        label: "DEEP",
        color: "BLACK",
    },
    StageDisplay {
        level: SleepLevel::Light,
        rank: 2,
        label: "LIGHT",
        color: "BLUE",
    },
    StageDisplay {
        level: SleepLevel::Rem,
        rank: 3,
        label: "REM",
        color: "PURPLE",
    },
    StageDisplay {
        level: SleepLevel::Wake,
        rank: 4,
        label: "WAKE",
        color: "YELLOW",
    },
];

pub fn stage_display(level: SleepLevel) -> &'static StageDisplay {
    &STAGE_DISPLAY[usize::from(level.display_rank() - 1)]
}

/// Heart-rate sample tagged with the stage it falls in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedPoint {
    pub time: DateTime<Utc>,
    pub heart_rate: u32,
    pub sleep_stage: Option<SleepLevel>,
    pub stage_rank: Option<u8>,
}

/// Tag every heart-rate sample with the stage whose `[start, end)` contains
/// it. When stages overlap, the later one in payload order wins.
pub fn combine_heart_rate_with_stages(payload: &ApiPayload) -> Vec<CombinedPoint> {
    payload
        .heart_rate
        .iter()
        .map(|hr| {
            let stage = payload
                .sleep_stages
                .iter()
                .rev()
                .find(|s| hr.time >= s.start_time && hr.time < s.end_time)
                .map(|s| s.level);
            CombinedPoint {
                time: hr.time,
                heart_rate: hr.value,
                sleep_stage: stage,
                stage_rank: stage.map(|l| l.display_rank()),
            }
        })
        .collect()
}
