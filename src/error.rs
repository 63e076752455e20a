//! Error types for Sleep Flux

use thiserror::Error;

/// Errors that can occur during computation
///
/// Absent or empty upstream data is not an error: the pipeline degrades to
/// empty projections instead. Only inputs that would otherwise produce a
/// silently wrong answer surface here.
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Failed to parse {field} from {value:?}")]
    TimestampParse { field: &'static str, value: String },

    #[error("Invalid time window: start {start} is after end {end}")]
    InvalidWindow { start: String, end: String },

    #[error("Invalid smoothing window of {size} points (centered: {centered})")]
    InvalidSmoothingWindow { size: usize, centered: bool },

    #[error("Date out of range: {0}")]
    DateOutOfRange(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ComputeError {
    pub(crate) fn timestamp(field: &'static str, value: &str) -> Self {
        ComputeError::TimestampParse {
            field,
            value: value.to_string(),
        }
    }
}
