//! Chart specification builders
//!
//! Translates chart configurations plus already-transformed data into
//! declarative, renderer-agnostic chart specifications (Vega-Lite shaped
//! JSON). No rendering happens here; a collaborator rasterizes the spec.

pub mod bar;
pub mod distribution;
pub mod export;
pub mod line;
pub mod scatter;
pub mod spec;

use thiserror::Error;

pub use bar::bar_chart_spec;
pub use distribution::{histogram_spec, value_counts_spec};
pub use export::{apply_export_options, Background, ChartRenderer, ImageExportOptions};
pub use line::line_chart_spec;
pub use scatter::scatter_chart_spec;
pub use spec::ChartSpec;

/// Errors raised while building or exporting chart specifications.
#[derive(Error, Debug)]
pub enum ChartError {
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("chart rendering failed: {0}")]
    Render(String),
}
