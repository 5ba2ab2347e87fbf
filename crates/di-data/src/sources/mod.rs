//! Ingestion sources
//!
//! Both sources reduce their input to headers plus stringified rows, then
//! share one arrow-array construction path driven by the inferred schema.

pub mod delimited;
pub mod spreadsheet;

pub use delimited::read_delimited;
pub use spreadsheet::read_spreadsheet;

use std::sync::Arc;

use arrow::array::{
    ArrayRef, BooleanBuilder, Float64Builder, Int64Builder, StringBuilder,
    TimestampMillisecondBuilder,
};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;

use crate::infer::{infer_schema, parse_bool, parse_timestamp_ms};
use crate::DataError;

/// Build a record batch from stringified rows. Cells that fail to parse as
/// the inferred type become nulls rather than errors.
pub(crate) fn build_batch(headers: &[String], rows: &[Vec<String>]) -> Result<RecordBatch, DataError> {
    let schema = Arc::new(infer_schema(headers, rows));
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(headers.len());

    for (col_idx, field) in schema.fields().iter().enumerate() {
        let cells = rows.iter().map(|row| {
            row.get(col_idx)
                .map(String::as_str)
                .filter(|value| !value.is_empty())
        });
        let array: ArrayRef = match field.data_type() {
            DataType::Int64 => {
                let mut builder = Int64Builder::new();
                for cell in cells {
                    builder.append_option(cell.and_then(|value| value.parse::<i64>().ok()));
                }
                Arc::new(builder.finish())
            }
            DataType::Float64 => {
                let mut builder = Float64Builder::new();
                for cell in cells {
                    builder.append_option(cell.and_then(|value| value.parse::<f64>().ok()));
                }
                Arc::new(builder.finish())
            }
            DataType::Boolean => {
                let mut builder = BooleanBuilder::new();
                for cell in cells {
                    builder.append_option(cell.and_then(parse_bool));
                }
                Arc::new(builder.finish())
            }
            DataType::Timestamp(_, _) => {
                let mut builder = TimestampMillisecondBuilder::new();
                for cell in cells {
                    builder.append_option(cell.and_then(parse_timestamp_ms));
                }
                Arc::new(builder.finish())
            }
            _ => {
                let mut builder = StringBuilder::new();
                for cell in cells {
                    builder.append_option(cell);
                }
                Arc::new(builder.finish())
            }
        };
        columns.push(array);
    }

    RecordBatch::try_new(schema, columns).map_err(DataError::Arrow)
}
