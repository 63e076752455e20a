//! Sleep Flux - Sleep-stage and heart-rate alignment for wearable data
//!
//! Flux turns raw vendor sleep logs and time-only intraday heart rate into an
//! aligned, query-windowed structure through a deterministic pipeline:
//! vendor adaptation → timestamp reconstruction → interval windowing →
//! heart-rate alignment and smoothing → chart or API projection.
//!
//! ## Modules
//!
//! - **Stages**: `reconstruct`, `intervals`, `aligner`, `aggregator`
//! - **Boundaries**: `adapters` (vendor JSON in), `source` (fetch seam), `pipeline` (entry points)

pub mod adapters;
pub mod aggregator;
pub mod aligner;
pub mod chart;
pub mod error;
pub mod intervals;
pub mod pipeline;
pub mod reconstruct;
pub mod source;
pub mod timestamps;
pub mod types;
pub mod window;

pub use aggregator::{AggregatorConfig, SleepHeartRateAggregator};
pub use aligner::SeriesAligner;
pub use error::ComputeError;
pub use intervals::IntervalSet;
pub use pipeline::{sleep_data_to_api_json, sleep_data_to_chart_json, SleepDataProcessor};
pub use reconstruct::TimeReconstructor;
pub use source::{JsonFileSource, SleepDataSource};
pub use window::TimeWindow;

/// Flux version reported by the CLI
pub const FLUX_VERSION: &str = env!("CARGO_PKG_VERSION");
