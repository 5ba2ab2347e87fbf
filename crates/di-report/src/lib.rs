//! Analysis-report assembly and export
//!
//! Turns a profiled dataset into an ordered sequence of titled, formatted
//! tables, and serializes tables for the export collaborators (CSV here,
//! paginated documents behind a trait).

pub mod assemble;
pub mod export;
pub mod format;

use thiserror::Error;

pub use assemble::{assemble_report, Report, ReportSection, ReportSections};
pub use export::{grouped_to_csv, table_to_csv, ReportRenderer};
pub use format::{FormatOptions, Table};

/// Errors raised while assembling or exporting reports.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("CSV write error: {0}")]
    Csv(String),

    #[error("document rendering failed: {0}")]
    Render(String),
}
