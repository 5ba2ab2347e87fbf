//! Dataset ingestion
//!
//! Turns an uploaded byte stream (delimited text or a spreadsheet) into a
//! [`Dataset`](di_core::Dataset). Parsing failures surface as a
//! [`DataError`] and never touch the session's current dataset.

pub mod infer;
pub mod sources;

use thiserror::Error;
use tracing::info;

use di_core::Dataset;

pub use sources::{read_delimited, read_spreadsheet};

/// Errors that can occur while ingesting a dataset.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(String),

    #[error("spreadsheet error: {0}")]
    Spreadsheet(String),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("'{0}' contains no table data")]
    Empty(String),

    #[error("unsupported file type: {0}")]
    UnsupportedFormat(String),
}

impl From<csv::Error> for DataError {
    fn from(error: csv::Error) -> Self {
        match error.kind() {
            csv::ErrorKind::Io(io_err) => {
                DataError::Io(std::io::Error::new(io_err.kind(), error.to_string()))
            }
            _ => DataError::Csv(error.to_string()),
        }
    }
}

/// Source format, decided from the uploaded file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Delimited,
    Spreadsheet,
}

impl SourceFormat {
    pub fn from_file_name(name: &str) -> Result<Self, DataError> {
        let extension = name.rsplit('.').next().unwrap_or_default().to_ascii_lowercase();
        match extension.as_str() {
            "csv" | "tsv" | "txt" => Ok(SourceFormat::Delimited),
            "xlsx" | "xls" | "xlsm" | "ods" => Ok(SourceFormat::Spreadsheet),
            _ => Err(DataError::UnsupportedFormat(name.to_string())),
        }
    }
}

/// Ingest an uploaded file into a dataset. The format is chosen from the
/// file name; the bytes are parsed entirely in memory.
pub fn ingest_bytes(name: &str, bytes: &[u8]) -> Result<Dataset, DataError> {
    let dataset = match SourceFormat::from_file_name(name)? {
        SourceFormat::Delimited => read_delimited(name, bytes)?,
        SourceFormat::Spreadsheet => read_spreadsheet(name, bytes)?,
    };
    info!(
        name,
        rows = dataset.num_rows(),
        columns = dataset.num_columns(),
        "ingested dataset"
    );
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_file_name() {
        assert_eq!(SourceFormat::from_file_name("sales.csv").unwrap(), SourceFormat::Delimited);
        assert_eq!(SourceFormat::from_file_name("Sales.XLSX").unwrap(), SourceFormat::Spreadsheet);
        assert!(matches!(
            SourceFormat::from_file_name("image.png"),
            Err(DataError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_ingest_csv_bytes() {
        let dataset = ingest_bytes("t.csv", b"a,b\n1,x\n2,y\n").unwrap();
        assert_eq!(dataset.num_rows(), 2);
        assert_eq!(dataset.column_names(), vec!["a", "b"]);
    }
}
