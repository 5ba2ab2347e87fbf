//! Scatter-plot data preparation
//!
//! Column selection, essential-null dropping, optional jitter and seeded
//! row sampling. Jitter and sampling use fixed seeds so re-rendering a
//! chart never reshuffles the points.

use ahash::AHashSet;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use di_core::config::ScatterChartConfig;
use di_core::{CellValue, ColumnKind, Dataset};
use di_data::infer::parse_timestamp_ms;

use crate::{stats, TransformError};

const JITTER_SEED: u64 = 42;
const SAMPLE_SEED: u64 = 1;
/// Jitter amplitude as a fraction of the column's standard deviation.
const JITTER_FRACTION: f64 = 0.005;

/// The data-facing subset of a scatter configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterRequest {
    pub x_col: String,
    pub y_col: String,
    pub treat_x_as_time: bool,
    pub color_col: Option<String>,
    pub size_col: Option<String>,
    pub facet_col: Option<String>,
    pub jitter: bool,
    /// 0 keeps every row.
    pub sample_rows: usize,
}

impl ScatterRequest {
    pub fn new(x_col: impl Into<String>, y_col: impl Into<String>) -> Self {
        Self {
            x_col: x_col.into(),
            y_col: y_col.into(),
            treat_x_as_time: false,
            color_col: None,
            size_col: None,
            facet_col: None,
            jitter: false,
            sample_rows: 0,
        }
    }

    pub fn from_config(config: &ScatterChartConfig) -> Self {
        use di_core::config::PointSize;
        Self {
            x_col: config.x_col.clone(),
            y_col: config.y_col.clone(),
            treat_x_as_time: config.treat_x_as_time,
            color_col: config.color.column().map(str::to_string),
            size_col: match &config.size {
                PointSize::ByColumn { column, .. } => Some(column.clone()),
                PointSize::Fixed { .. } => None,
            },
            facet_col: config.facet_col.clone(),
            jitter: config.jitter,
            sample_rows: config.sample_rows,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterColumn {
    pub name: String,
    pub values: Vec<Option<CellValue>>,
}

/// Columnar frame of the rows a scatter spec will inline.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterFrame {
    pub columns: Vec<ScatterColumn>,
}

impl ScatterFrame {
    pub fn num_rows(&self) -> usize {
        self.columns.first().map_or(0, |column| column.values.len())
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    pub fn column(&self, name: &str) -> Option<&ScatterColumn> {
        self.columns.iter().find(|column| column.name == name)
    }
}

pub fn prepare_scatter(dataset: &Dataset, request: &ScatterRequest) -> Result<ScatterFrame, TransformError> {
    // Selection order mirrors the config; duplicates collapse to one column.
    let mut selected: Vec<&str> = Vec::new();
    let mut seen: AHashSet<&str> = AHashSet::new();
    for name in [Some(request.x_col.as_str()), Some(request.y_col.as_str())]
        .into_iter()
        .chain([
            request.color_col.as_deref(),
            request.size_col.as_deref(),
            request.facet_col.as_deref(),
        ])
        .flatten()
    {
        if seen.insert(name) {
            selected.push(name);
        }
    }
    for name in &selected {
        if dataset.column(name).is_none() {
            return Err(TransformError::MissingColumn(name.to_string()));
        }
    }
    if dataset.numeric_values(&request.y_col).is_none() {
        return Err(TransformError::NotNumeric(request.y_col.clone()));
    }

    let mut columns: Vec<ScatterColumn> = selected
        .iter()
        .map(|name| ScatterColumn {
            name: name.to_string(),
            values: (0..dataset.num_rows())
                .map(|row| cell_for(dataset, name, row, request))
                .collect(),
        })
        .collect();

    // Drop rows missing an essential field: x, y, and the size column when
    // sizing is data-driven.
    let mut essential: Vec<&str> = vec![&request.x_col, &request.y_col];
    if let Some(size_col) = &request.size_col {
        essential.push(size_col);
    }
    let keep: Vec<usize> = (0..dataset.num_rows())
        .filter(|&row| {
            essential.iter().all(|name| {
                columns
                    .iter()
                    .find(|column| column.name == **name)
                    .map_or(false, |column| column.values[row].is_some())
            })
        })
        .collect();
    for column in &mut columns {
        let kept: Vec<Option<CellValue>> =
            keep.iter().map(|&row| column.values[row].take()).collect();
        column.values = kept;
    }

    let mut frame = ScatterFrame { columns };
    if request.jitter {
        apply_jitter(&mut frame, &request.x_col, &request.y_col);
    }
    if request.sample_rows > 0 && frame.num_rows() > request.sample_rows {
        sample_rows(&mut frame, request.sample_rows);
    }
    Ok(frame)
}

fn cell_for(dataset: &Dataset, name: &str, row: usize, request: &ScatterRequest) -> Option<CellValue> {
    if name == request.x_col && request.treat_x_as_time {
        if dataset.raw_kind(name) == Some(ColumnKind::Datetime) {
            return dataset.cell_value(name, row);
        }
        return dataset
            .display_value(name, row)
            .and_then(|text| parse_timestamp_ms(&text))
            .map(CellValue::Time);
    }
    dataset.cell_value(name, row)
}

/// Nudge numeric axes by uniform noise scaled to a small fraction of the
/// column's spread, so overplotted points separate without changing shape.
fn apply_jitter(frame: &mut ScatterFrame, x_col: &str, y_col: &str) {
    let mut rng = StdRng::seed_from_u64(JITTER_SEED);
    for name in [x_col, y_col] {
        let Some(column) = frame.columns.iter_mut().find(|column| column.name == name) else {
            continue;
        };
        let numeric: Vec<f64> = column
            .values
            .iter()
            .flatten()
            .filter_map(CellValue::as_f64)
            .collect();
        if numeric.len() != column.values.len() {
            continue; // non-numeric axis, leave untouched
        }
        let avg = stats::mean(&numeric);
        let spread =
            (numeric.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / numeric.len() as f64).sqrt();
        if spread == 0.0 || !spread.is_finite() {
            continue;
        }
        let amplitude = spread * JITTER_FRACTION;
        for value in column.values.iter_mut() {
            if let Some(CellValue::Number(v)) = value {
                *v += rng.gen_range(-amplitude..=amplitude);
            }
        }
    }
}

fn sample_rows(frame: &mut ScatterFrame, n: usize) {
    let mut rng = StdRng::seed_from_u64(SAMPLE_SEED);
    let len = frame.num_rows();
    let mut indices = rand::seq::index::sample(&mut rng, len, n).into_vec();
    indices.sort_unstable();
    for column in &mut frame.columns {
        let sampled: Vec<Option<CellValue>> =
            indices.iter().map(|&row| column.values[row].take()).collect();
        column.values = sampled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{ArrayRef, Float64Array, StringArray};
    use std::sync::Arc;

    fn dataset() -> Dataset {
        Dataset::from_columns(
            "t",
            vec![
                (
                    "x",
                    Arc::new(Float64Array::from(vec![Some(1.0), Some(2.0), None, Some(4.0)]))
                        as ArrayRef,
                ),
                (
                    "y",
                    Arc::new(Float64Array::from(vec![Some(1.0), None, Some(3.0), Some(4.0)]))
                        as ArrayRef,
                ),
                (
                    "cat",
                    Arc::new(StringArray::from(vec!["a", "b", "a", "b"])) as ArrayRef,
                ),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_drops_rows_missing_essentials() {
        let mut request = ScatterRequest::new("x", "y");
        request.color_col = Some("cat".into());
        let frame = prepare_scatter(&dataset(), &request).unwrap();
        // Rows 1 and 2 miss y and x respectively.
        assert_eq!(frame.num_rows(), 2);
        assert_eq!(
            frame.column("cat").unwrap().values,
            vec![Some(CellValue::Text("a".into())), Some(CellValue::Text("b".into()))]
        );
    }

    #[test]
    fn test_sampling_is_deterministic() {
        let xs: Vec<f64> = (0..100).map(|v| v as f64).collect();
        let data = Dataset::from_columns(
            "t",
            vec![
                ("x", Arc::new(Float64Array::from(xs.clone())) as ArrayRef),
                ("y", Arc::new(Float64Array::from(xs)) as ArrayRef),
            ],
        )
        .unwrap();
        let mut request = ScatterRequest::new("x", "y");
        request.sample_rows = 10;
        let first = prepare_scatter(&data, &request).unwrap();
        let second = prepare_scatter(&data, &request).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.num_rows(), 10);
    }

    #[test]
    fn test_jitter_preserves_rank_scale() {
        let xs: Vec<f64> = (0..50).map(|v| v as f64).collect();
        let data = Dataset::from_columns(
            "t",
            vec![
                ("x", Arc::new(Float64Array::from(xs.clone())) as ArrayRef),
                ("y", Arc::new(Float64Array::from(xs)) as ArrayRef),
            ],
        )
        .unwrap();
        let mut request = ScatterRequest::new("x", "y");
        request.jitter = true;
        let frame = prepare_scatter(&data, &request).unwrap();
        let jittered: Vec<f64> = frame
            .column("x")
            .unwrap()
            .values
            .iter()
            .flatten()
            .filter_map(CellValue::as_f64)
            .collect();
        // Perturbed, but by far less than one unit of the original spacing.
        assert!(jittered.iter().enumerate().all(|(idx, v)| (v - idx as f64).abs() < 0.5));
        assert!(jittered.iter().enumerate().any(|(idx, v)| (v - idx as f64).abs() > 0.0));
    }

    #[test]
    fn test_missing_column_errors() {
        let request = ScatterRequest::new("x", "nope");
        assert_eq!(
            prepare_scatter(&dataset(), &request).unwrap_err(),
            TransformError::MissingColumn("nope".into())
        );
    }
}
