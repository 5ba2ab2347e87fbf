//! Data-transformation pipelines
//!
//! Everything between the raw dataset and a chart or report: column
//! classification, grouped aggregation, value counts, time-series
//! resampling with gap filling, scatter preparation, distribution
//! preparation and dataset profiling.

pub mod aggregate;
pub mod classify;
pub mod distribution;
pub mod profile;
pub mod resample;
pub mod scatter;
pub mod stats;

use thiserror::Error;

pub use aggregate::{AggregationRequest, GroupKey, GroupedResult, GroupedRow, ValueCounts};
pub use classify::{classify_columns, DEFAULT_LOW_CARDINALITY};
pub use profile::{profile_dataset, DatasetProfile};
pub use resample::{AxisValue, ResampleRequest, SeriesFrame, SeriesPoint};
pub use scatter::{prepare_scatter, ScatterFrame, ScatterRequest};

/// Errors raised by the transformation pipelines.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    #[error("no such column: {0}")]
    MissingColumn(String),

    #[error("column '{0}' is not numeric")]
    NotNumeric(String),

    #[error(transparent)]
    Config(#[from] di_core::config::ConfigError),
}
