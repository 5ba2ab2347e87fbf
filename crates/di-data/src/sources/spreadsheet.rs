//! Spreadsheet source (xlsx/xls/ods)
//!
//! Reads the first worksheet. Cells are stringified and then run through
//! the same inference and array construction as delimited text, so a
//! spreadsheet and a CSV of the same table produce the same dataset.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};

use di_core::Dataset;

use super::build_batch;
use crate::DataError;

pub fn read_spreadsheet(name: &str, bytes: &[u8]) -> Result<Dataset, DataError> {
    let cursor = Cursor::new(bytes.to_vec());
    let mut workbook =
        open_workbook_auto_from_rs(cursor).map_err(|e| DataError::Spreadsheet(e.to_string()))?;

    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| DataError::Empty(name.to_string()))?;
    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| DataError::Spreadsheet(e.to_string()))?;

    let mut rows_iter = range.rows();
    let header_row = rows_iter.next().ok_or_else(|| DataError::Empty(name.to_string()))?;
    let headers: Vec<String> = header_row
        .iter()
        .enumerate()
        .map(|(idx, cell)| {
            let text = cell_to_string(cell);
            if text.is_empty() {
                format!("column_{}", idx + 1)
            } else {
                text
            }
        })
        .collect();

    let rows: Vec<Vec<String>> = rows_iter
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect();

    let batch = build_batch(&headers, &rows)?;
    Ok(Dataset::new(name, batch))
}

/// Stringify one cell; empty string means null. Integral floats lose the
/// trailing ".0" so the inferred type stays integer.
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(text) => text.clone(),
        Data::Int(value) => value.to_string(),
        Data::Float(value) => {
            if value.fract() == 0.0 && value.abs() < 9.0e15 {
                format!("{}", *value as i64)
            } else {
                value.to_string()
            }
        }
        Data::Bool(value) => value.to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|naive| naive.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default(),
        Data::DateTimeIso(text) | Data::DurationIso(text) => text.clone(),
    }
}
