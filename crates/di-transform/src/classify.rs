//! Column classification into semantic buckets
//!
//! Buckets drive which columns each chart type offers: grouping columns for
//! bars, numeric series for lines, time axes for resampling. Low-cardinality
//! numeric and datetime columns are treated as categorical so that, say, a
//! "quarter" column with four distinct integers groups like a label.

use indexmap::IndexMap;

use di_core::{ColumnKind, Dataset};
use di_data::infer::parse_timestamp_ms;

/// Distinct-value threshold at or below which a numeric or datetime column
/// is treated as categorical.
pub const DEFAULT_LOW_CARDINALITY: usize = 30;

/// Non-null values sampled when probing a text column for datetimes.
const DATETIME_PROBE_SAMPLE: usize = 20;

/// Bucket a single column. `None` when the column does not exist.
pub fn bucket_for_column(dataset: &Dataset, name: &str, threshold: usize) -> Option<ColumnKind> {
    let raw = dataset.raw_kind(name)?;
    let bucket = match raw {
        ColumnKind::Boolean | ColumnKind::Categorical => ColumnKind::Categorical,
        ColumnKind::Numeric => {
            if dataset.distinct_count(name)? <= threshold {
                ColumnKind::Categorical
            } else {
                ColumnKind::Numeric
            }
        }
        ColumnKind::Datetime => {
            if dataset.distinct_count(name)? <= threshold {
                ColumnKind::Categorical
            } else {
                ColumnKind::Datetime
            }
        }
        ColumnKind::Other => ColumnKind::Other,
    };
    Some(bucket)
}

/// Partition every column into exactly one bucket. All four bucket keys are
/// always present, in a fixed order, so callers can iterate deterministically.
pub fn classify_columns(dataset: &Dataset, threshold: usize) -> IndexMap<ColumnKind, Vec<String>> {
    let mut buckets: IndexMap<ColumnKind, Vec<String>> = IndexMap::new();
    for kind in [
        ColumnKind::Numeric,
        ColumnKind::Categorical,
        ColumnKind::Datetime,
        ColumnKind::Other,
    ] {
        buckets.insert(kind, Vec::new());
    }

    for name in dataset.column_names() {
        if let Some(bucket) = bucket_for_column(dataset, &name, threshold) {
            if let Some(columns) = buckets.get_mut(&bucket) {
                columns.push(name);
            }
        }
    }
    buckets
}

/// Columns a chart can group by: everything bucketed categorical, sorted by
/// name.
pub fn selectable_categorical(dataset: &Dataset, threshold: usize) -> Vec<String> {
    let mut columns = classify_columns(dataset, threshold)
        .swap_remove(&ColumnKind::Categorical)
        .unwrap_or_default();
    columns.sort();
    columns
}

/// Columns a chart can aggregate: raw numeric columns in schema order.
pub fn selectable_numeric(dataset: &Dataset) -> Vec<String> {
    dataset
        .column_names()
        .into_iter()
        .filter(|name| dataset.raw_kind(name) == Some(ColumnKind::Numeric))
        .collect()
}

/// Columns usable as a time axis: datetime columns plus text columns whose
/// sampled non-null values all parse as datetimes.
pub fn datetime_candidates(dataset: &Dataset) -> Vec<String> {
    dataset
        .column_names()
        .into_iter()
        .filter(|name| match dataset.raw_kind(name) {
            Some(ColumnKind::Datetime) => true,
            Some(ColumnKind::Categorical) => text_column_parses_as_datetime(dataset, name),
            _ => false,
        })
        .collect()
}

fn text_column_parses_as_datetime(dataset: &Dataset, name: &str) -> bool {
    let rows = dataset.num_rows();
    let mut sampled = 0;
    for row in 0..rows {
        if sampled >= DATETIME_PROBE_SAMPLE {
            break;
        }
        if let Some(text) = dataset.display_value(name, row) {
            sampled += 1;
            if parse_timestamp_ms(&text).is_none() {
                return false;
            }
        }
    }
    sampled > 0
}
