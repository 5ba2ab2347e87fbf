//! Sample-based column type inference
//!
//! Upload formats carry no type information, so types are inferred from a
//! sample of stringified rows: boolean, integer, float, timestamp, and
//! text as the fallback. Empty strings count as nulls and never vote.

use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use chrono::{NaiveDate, NaiveDateTime};

/// Rows sampled for type detection.
pub const MAX_SAMPLE_ROWS: usize = 5000;

const DATETIME_FORMATS: [&str; 5] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Infer a schema for string rows. All fields are nullable.
pub fn infer_schema(headers: &[String], samples: &[Vec<String>]) -> Schema {
    let fields: Vec<Field> = headers
        .iter()
        .enumerate()
        .map(|(idx, name)| Field::new(name, detect_column_type(samples, idx), true))
        .collect();
    Schema::new(fields)
}

/// Detect one column's type from sample data.
pub fn detect_column_type(samples: &[Vec<String>], col_idx: usize) -> DataType {
    let mut is_bool = true;
    let mut is_int = true;
    let mut is_float = true;
    let mut is_timestamp = true;
    let mut saw_value = false;

    for row in samples.iter().take(MAX_SAMPLE_ROWS) {
        let Some(value) = row.get(col_idx) else { continue };
        if value.is_empty() {
            continue;
        }
        saw_value = true;

        if is_bool && parse_bool_strict(value).is_none() {
            is_bool = false;
        }
        if is_int && value.parse::<i64>().is_err() {
            is_int = false;
        }
        if is_float && value.parse::<f64>().is_err() {
            is_float = false;
        }
        if is_timestamp && parse_timestamp_ms(value).is_none() {
            is_timestamp = false;
        }
        if !is_bool && !is_int && !is_float && !is_timestamp {
            break;
        }
    }

    if !saw_value {
        DataType::Utf8
    } else if is_bool {
        DataType::Boolean
    } else if is_int {
        DataType::Int64
    } else if is_float {
        DataType::Float64
    } else if is_timestamp {
        DataType::Timestamp(TimeUnit::Millisecond, None)
    } else {
        DataType::Utf8
    }
}

/// Parse a datetime string to epoch milliseconds (UTC). Returns `None` for
/// anything unparsable; callers turn that into a null, not an error.
pub fn parse_timestamp_ms(value: &str) -> Option<i64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(value) {
        return Some(dt.timestamp_millis());
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt.and_utc().timestamp_millis());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return date
                .and_hms_opt(0, 0, 0)
                .map(|dt| dt.and_utc().timestamp_millis());
        }
    }
    None
}

/// Strict boolean used for type detection: only true/false vote, so 0/1
/// columns stay integers.
fn parse_bool_strict(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Lenient boolean used when building a column already typed as boolean.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}
