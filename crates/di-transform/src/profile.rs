//! Dataset profiling
//!
//! Computes the fixed set of named results behind the analysis report:
//! shape, memory footprint, missingness, duplicates, per-bucket descriptive
//! statistics, distinct counts and the numeric correlation matrix. Every
//! computation tolerates zero rows, zero columns and all-null columns.

use ahash::{AHashMap, AHashSet};
use itertools::Itertools;

use di_core::{ColumnKind, Dataset};

use crate::stats;

#[derive(Debug, Clone, PartialEq)]
pub struct MissingColumn {
    pub name: String,
    pub null_count: usize,
    pub null_pct: f64,
}

/// Descriptive-statistics row for a numeric column.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericSummary {
    pub name: String,
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub q50: f64,
    pub q75: f64,
    pub max: f64,
}

/// describe() row for a categorical (or boolean) column.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoricalSummary {
    pub name: String,
    pub count: usize,
    pub unique: usize,
    /// Most frequent value; `None` for an all-null column.
    pub top: Option<String>,
    pub freq: usize,
}

/// Pairwise Pearson correlations over the numeric columns.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    /// Row-major; `None` where a pair has no defined correlation.
    pub values: Vec<Vec<Option<f64>>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DatasetProfile {
    pub rows: usize,
    pub columns: usize,
    pub memory_bytes: usize,
    pub missing: Vec<MissingColumn>,
    pub duplicate_rows: usize,
    pub numeric: Vec<NumericSummary>,
    pub categorical: Vec<CategoricalSummary>,
    pub unique_counts: Vec<(String, usize)>,
    /// Omitted when fewer than two numeric columns exist.
    pub correlation: Option<CorrelationMatrix>,
}

pub fn profile_dataset(dataset: &Dataset) -> DatasetProfile {
    let rows = dataset.num_rows();
    let names = dataset.column_names();

    let missing = names
        .iter()
        .map(|name| {
            let null_count = dataset.null_count(name).unwrap_or(0);
            MissingColumn {
                name: name.clone(),
                null_count,
                null_pct: if rows > 0 {
                    null_count as f64 / rows as f64 * 100.0
                } else {
                    0.0
                },
            }
        })
        .collect();

    let numeric = names
        .iter()
        .filter(|name| dataset.raw_kind(name) == Some(ColumnKind::Numeric))
        .map(|name| numeric_summary(dataset, name))
        .collect();

    let categorical = names
        .iter()
        .filter(|name| {
            matches!(
                dataset.raw_kind(name),
                Some(ColumnKind::Categorical) | Some(ColumnKind::Boolean)
            )
        })
        .map(|name| categorical_summary(dataset, name))
        .collect();

    let unique_counts = names
        .iter()
        .map(|name| (name.clone(), dataset.distinct_count(name).unwrap_or(0)))
        .collect();

    DatasetProfile {
        rows,
        columns: dataset.num_columns(),
        memory_bytes: dataset.memory_bytes(),
        missing,
        duplicate_rows: duplicate_row_indices(dataset).len(),
        numeric,
        categorical,
        unique_counts,
        correlation: correlation_matrix(dataset),
    }
}

fn numeric_summary(dataset: &Dataset, name: &str) -> NumericSummary {
    let values: Vec<f64> = dataset
        .numeric_values(name)
        .unwrap_or_default()
        .into_iter()
        .flatten()
        .collect();
    let (q25, q50, q75) = stats::quartiles(&values);
    NumericSummary {
        name: name.to_string(),
        count: values.len(),
        mean: stats::mean(&values),
        std: stats::sample_std(&values),
        min: values.iter().copied().fold(f64::NAN, f64::min),
        q25,
        q50,
        q75,
        max: values.iter().copied().fold(f64::NAN, f64::max),
    }
}

fn categorical_summary(dataset: &Dataset, name: &str) -> CategoricalSummary {
    let mut counts: AHashMap<String, usize> = AHashMap::new();
    let mut order: Vec<String> = Vec::new();
    let mut count = 0;
    for row in 0..dataset.num_rows() {
        if let Some(text) = dataset.display_value(name, row) {
            count += 1;
            let entry = counts.entry(text.clone()).or_insert(0);
            if *entry == 0 {
                order.push(text);
            }
            *entry += 1;
        }
    }

    // Ties break on first appearance, keeping the result deterministic.
    let mut top: Option<String> = None;
    let mut freq = 0;
    for value in &order {
        let count = counts.get(value).copied().unwrap_or(0);
        if count > freq {
            freq = count;
            top = Some(value.clone());
        }
    }

    CategoricalSummary {
        name: name.to_string(),
        count,
        unique: counts.len(),
        top,
        freq,
    }
}

/// Indices of rows that repeat an earlier row, compared on rendered values.
pub fn duplicate_row_indices(dataset: &Dataset) -> Vec<usize> {
    let names = dataset.column_names();
    if names.is_empty() || dataset.num_rows() == 0 {
        return Vec::new();
    }

    let mut seen: AHashSet<String> = AHashSet::new();
    let mut duplicates = Vec::new();
    for row in 0..dataset.num_rows() {
        let key = names
            .iter()
            .map(|name| dataset.display_value(name, row).unwrap_or_else(|| "\u{0}".to_string()))
            .join("\u{1f}");
        if !seen.insert(key) {
            duplicates.push(row);
        }
    }
    duplicates
}

fn correlation_matrix(dataset: &Dataset) -> Option<CorrelationMatrix> {
    let numeric_columns: Vec<String> = dataset
        .column_names()
        .into_iter()
        .filter(|name| dataset.raw_kind(name) == Some(ColumnKind::Numeric))
        .collect();
    if numeric_columns.len() < 2 {
        return None;
    }

    let series: Vec<Vec<Option<f64>>> = numeric_columns
        .iter()
        .filter_map(|name| dataset.numeric_values(name))
        .collect();
    let values = series
        .iter()
        .map(|xs| series.iter().map(|ys| stats::pearson(xs, ys)).collect())
        .collect();
    Some(CorrelationMatrix { columns: numeric_columns, values })
}

/// Single-series describe with extended percentiles, used by the
/// distribution view's summary panel.
pub fn describe_series(values: &[f64], percentiles: &[f64]) -> Vec<(String, f64)> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mut out = vec![
        ("count".to_string(), values.len() as f64),
        ("mean".to_string(), stats::mean(values)),
        ("std".to_string(), stats::sample_std(values)),
        ("min".to_string(), sorted.first().copied().unwrap_or(f64::NAN)),
    ];
    for &p in percentiles {
        let label = if (p * 100.0).fract() == 0.0 {
            format!("{}%", (p * 100.0) as i64)
        } else {
            format!("{}%", p * 100.0)
        };
        out.push((label, stats::percentile(&sorted, p)));
    }
    out.push(("max".to_string(), sorted.last().copied().unwrap_or(f64::NAN)));
    out
}

/// Default histogram bin count: the square-root rule clamped to [10, 30].
pub fn default_bin_count(distinct: usize) -> usize {
    ((distinct.max(1) as f64).sqrt() as usize).clamp(10, 30)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
    use std::sync::Arc;

    fn dataset() -> Dataset {
        Dataset::from_columns(
            "t",
            vec![
                (
                    "region",
                    Arc::new(StringArray::from(vec![
                        Some("North"),
                        Some("South"),
                        Some("North"),
                        None,
                    ])) as ArrayRef,
                ),
                (
                    "sales",
                    Arc::new(Float64Array::from(vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0)]))
                        as ArrayRef,
                ),
                (
                    "units",
                    Arc::new(Int64Array::from(vec![Some(2), Some(4), Some(6), Some(8)])) as ArrayRef,
                ),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_profile_shape_and_missing() {
        let profile = profile_dataset(&dataset());
        assert_eq!(profile.rows, 4);
        assert_eq!(profile.columns, 3);
        assert!(profile.memory_bytes > 0);
        assert_eq!(profile.missing[0].null_count, 1);
        assert_eq!(profile.missing[0].null_pct, 25.0);
    }

    #[test]
    fn test_numeric_summary_statistics() {
        let profile = profile_dataset(&dataset());
        let sales = &profile.numeric[0];
        assert_eq!(sales.count, 4);
        assert_eq!(sales.mean, 2.5);
        assert!((sales.std - 1.290_994_448).abs() < 1e-6);
        assert_eq!(sales.min, 1.0);
        assert_eq!(sales.q50, 2.5);
        assert_eq!(sales.max, 4.0);
    }

    #[test]
    fn test_categorical_summary() {
        let profile = profile_dataset(&dataset());
        let region = &profile.categorical[0];
        assert_eq!(region.count, 3);
        assert_eq!(region.unique, 2);
        assert_eq!(region.top.as_deref(), Some("North"));
        assert_eq!(region.freq, 2);
    }

    #[test]
    fn test_correlation_matrix() {
        let profile = profile_dataset(&dataset());
        let matrix = profile.correlation.unwrap();
        assert_eq!(matrix.columns, vec!["sales", "units"]);
        // units is exactly 2 × sales.
        assert!((matrix.values[0][1].unwrap() - 1.0).abs() < 1e-12);
        assert!((matrix.values[0][0].unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_correlation_omitted_for_single_numeric_column() {
        let data = Dataset::from_columns(
            "t",
            vec![("v", Arc::new(Float64Array::from(vec![1.0, 2.0])) as ArrayRef)],
        )
        .unwrap();
        assert!(profile_dataset(&data).correlation.is_none());
    }

    #[test]
    fn test_duplicates() {
        let data = Dataset::from_columns(
            "t",
            vec![
                (
                    "a",
                    Arc::new(StringArray::from(vec!["x", "y", "x", "x"])) as ArrayRef,
                ),
                (
                    "b",
                    Arc::new(Int64Array::from(vec![1, 2, 1, 3])) as ArrayRef,
                ),
            ],
        )
        .unwrap();
        assert_eq!(duplicate_row_indices(&data), vec![2]);
        assert_eq!(profile_dataset(&data).duplicate_rows, 1);
    }

    #[test]
    fn test_empty_and_all_null_datasets() {
        let empty = Dataset::from_columns(
            "t",
            vec![("v", Arc::new(Float64Array::from(Vec::<Option<f64>>::new())) as ArrayRef)],
        )
        .unwrap();
        let profile = profile_dataset(&empty);
        assert_eq!(profile.rows, 0);
        assert_eq!(profile.numeric[0].count, 0);
        assert!(profile.numeric[0].mean.is_nan());

        let all_null = Dataset::from_columns(
            "t",
            vec![(
                "s",
                Arc::new(StringArray::from(vec![None::<&str>, None])) as ArrayRef,
            )],
        )
        .unwrap();
        let profile = profile_dataset(&all_null);
        assert_eq!(profile.categorical[0].count, 0);
        assert_eq!(profile.categorical[0].top, None);
    }

    #[test]
    fn test_describe_series_percentile_labels() {
        let values: Vec<f64> = (1..=100).map(|v| v as f64).collect();
        let described = describe_series(&values, &[0.01, 0.25, 0.5, 0.75, 0.99]);
        let labels: Vec<&str> = described.iter().map(|(label, _)| label.as_str()).collect();
        assert_eq!(labels, vec!["count", "mean", "std", "min", "1%", "25%", "50%", "75%", "99%", "max"]);
    }

    #[test]
    fn test_default_bin_count() {
        assert_eq!(default_bin_count(4), 10);
        assert_eq!(default_bin_count(400), 20);
        assert_eq!(default_bin_count(10_000), 30);
    }
}
