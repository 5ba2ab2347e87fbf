//! Time-series resampling, gap filling, smoothing and indexing
//!
//! Produces the long-form series frame that line charts consume. When a
//! group column is present, resampling, filling, smoothing and
//! normalization all run independently per group, and groups are
//! concatenated back in sorted label order.
//!
//! Unparsable datetime values become nulls, never errors; a column with no
//! parsable values simply yields an empty frame for the caller to surface
//! as "nothing to plot".

use std::cmp::Ordering;
use std::fmt;

use ahash::AHashSet;
use chrono::{DateTime, Datelike, Days, Duration, Months, NaiveDate};
use indexmap::IndexMap;
use tracing::debug;

use di_core::config::{ConfigError, Frequency, LineChartConfig, MissingPolicy, SeriesStat};
use di_core::{CellValue, ColumnKind, Dataset};
use di_data::infer::parse_timestamp_ms;

use crate::{stats, TransformError};

/// A value on the x axis of a series.
#[derive(Debug, Clone, PartialEq)]
pub enum AxisValue {
    /// Epoch milliseconds, UTC.
    Time(i64),
    Number(f64),
    Text(String),
}

impl AxisValue {
    pub fn kind(&self) -> ColumnKind {
        match self {
            AxisValue::Time(_) => ColumnKind::Datetime,
            AxisValue::Number(_) => ColumnKind::Numeric,
            AxisValue::Text(_) => ColumnKind::Categorical,
        }
    }
}

impl fmt::Display for AxisValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AxisValue::Time(ms) => match DateTime::from_timestamp_millis(*ms) {
                Some(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
                None => write!(f, "{ms}"),
            },
            AxisValue::Number(v) => write!(f, "{v}"),
            AxisValue::Text(s) => f.write_str(s),
        }
    }
}

/// One resampling request.
#[derive(Debug, Clone, PartialEq)]
pub struct ResampleRequest {
    pub time_col: String,
    pub value_cols: Vec<String>,
    pub group_col: Option<String>,
    /// When false the x axis is used as-is (numeric or categorical) and
    /// `frequency` is ignored; interpolation falls back to ordinal.
    pub treat_as_time: bool,
    pub frequency: Frequency,
    pub stat: SeriesStat,
    pub missing: MissingPolicy,
    /// Trailing window size; 0 disables smoothing.
    pub rolling_window: usize,
    pub normalize_index: bool,
    /// Keep only the N groups with the largest first-series totals;
    /// 0 keeps every group.
    pub top_n_groups: usize,
}

impl ResampleRequest {
    pub fn new(time_col: impl Into<String>, value_cols: Vec<String>) -> Self {
        Self {
            time_col: time_col.into(),
            value_cols,
            group_col: None,
            treat_as_time: true,
            frequency: Frequency::None,
            stat: SeriesStat::Sum,
            missing: MissingPolicy::ForwardFill,
            rolling_window: 0,
            normalize_index: false,
            top_n_groups: 0,
        }
    }

    pub fn from_line_config(config: &LineChartConfig) -> Self {
        Self {
            time_col: config.x_col.clone(),
            value_cols: config.y_cols.clone(),
            group_col: config.group_col.clone(),
            treat_as_time: config.treat_as_time,
            frequency: config.frequency,
            stat: config.stat,
            missing: config.missing,
            rolling_window: config.rolling_window,
            normalize_index: config.normalize_index,
            top_n_groups: config.top_n_groups,
        }
    }
}

/// One long-form point.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPoint {
    pub x: AxisValue,
    /// Group label; `None` when the request had no group column. A null
    /// group key renders as "null".
    pub group: Option<String>,
    /// Name of the value column this point belongs to.
    pub series: String,
    pub value: Option<f64>,
}

impl SeriesPoint {
    /// Legend label: "group · series" when grouped, the series name
    /// otherwise.
    pub fn series_label(&self) -> String {
        match &self.group {
            Some(group) => format!("{group} · {}", self.series),
            None => self.series.clone(),
        }
    }
}

/// Long-form output of the resampler, ordered by (group, series, x).
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesFrame {
    pub x_column: String,
    pub temporal: bool,
    pub points: Vec<SeriesPoint>,
}

impl SeriesFrame {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }
}

/// Run one resample request against the dataset.
pub fn resample(dataset: &Dataset, request: &ResampleRequest) -> Result<SeriesFrame, TransformError> {
    if request.value_cols.is_empty() {
        return Err(ConfigError::NoSeriesColumns.into());
    }
    if dataset.column(&request.time_col).is_none() {
        return Err(TransformError::MissingColumn(request.time_col.clone()));
    }
    if let Some(group) = &request.group_col {
        if dataset.column(group).is_none() {
            return Err(TransformError::MissingColumn(group.clone()));
        }
    }

    let mut value_matrix: Vec<Vec<Option<f64>>> = Vec::with_capacity(request.value_cols.len());
    for name in &request.value_cols {
        if dataset.column(name).is_none() {
            return Err(TransformError::MissingColumn(name.clone()));
        }
        value_matrix.push(
            dataset
                .numeric_values(name)
                .ok_or_else(|| TransformError::NotNumeric(name.clone()))?,
        );
    }

    let xs = axis_values(dataset, &request.time_col, request.treat_as_time);
    let groups_per_row: Option<Vec<String>> = request.group_col.as_ref().map(|name| {
        (0..dataset.num_rows())
            .map(|row| {
                dataset
                    .cell_value(name, row)
                    .map(|cell| cell.to_string())
                    .unwrap_or_else(|| "null".to_string())
            })
            .collect()
    });

    // Rows without a placeable x never survive; the drop policy also
    // removes rows with any missing series value.
    let mut keep: Vec<usize> = Vec::new();
    for row in 0..dataset.num_rows() {
        if xs[row].is_none() {
            continue;
        }
        if request.missing == MissingPolicy::Drop
            && value_matrix.iter().any(|column| column[row].is_none())
        {
            continue;
        }
        keep.push(row);
    }

    // Keep the top-N groups ranked by the first series' total.
    if let Some(groups) = &groups_per_row {
        if request.top_n_groups > 0 {
            let mut totals: IndexMap<String, f64> = IndexMap::new();
            for &row in &keep {
                let total = totals.entry(groups[row].clone()).or_insert(0.0);
                if let Some(v) = value_matrix[0][row] {
                    *total += v;
                }
            }
            if totals.len() > request.top_n_groups {
                let mut ranked: Vec<(String, f64)> = totals.into_iter().collect();
                ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
                ranked.truncate(request.top_n_groups);
                let kept_groups: AHashSet<String> =
                    ranked.into_iter().map(|(group, _)| group).collect();
                keep.retain(|&row| kept_groups.contains(&groups[row]));
            }
        }
    }

    let mut partitions: IndexMap<Option<String>, Vec<usize>> = IndexMap::new();
    for &row in &keep {
        let label = groups_per_row.as_ref().map(|groups| groups[row].clone());
        partitions.entry(label).or_default().push(row);
    }
    partitions.sort_keys();

    let mut frame = SeriesFrame {
        x_column: request.time_col.clone(),
        temporal: request.treat_as_time,
        points: Vec::new(),
    };

    for (group_label, mut rows) in partitions {
        rows.sort_by(|a, b| cmp_axis_opt(&xs[*a], &xs[*b]));

        for (series_idx, series_name) in request.value_cols.iter().enumerate() {
            let mut series: Vec<(AxisValue, Option<f64>)> = rows
                .iter()
                .filter_map(|&row| {
                    xs[row]
                        .clone()
                        .map(|x| (x, value_matrix[series_idx][row]))
                })
                .collect();

            if request.treat_as_time && request.frequency != Frequency::None {
                series = resample_series(&series, request.frequency, request.stat);
            }

            let (axis, mut values): (Vec<AxisValue>, Vec<Option<f64>>) =
                series.into_iter().unzip();
            match request.missing {
                MissingPolicy::Drop => {}
                MissingPolicy::ForwardFill => forward_fill(&mut values),
                MissingPolicy::Interpolate => {
                    interpolate_gaps(&axis, &mut values, request.treat_as_time)
                }
            }
            if request.rolling_window > 0 {
                rolling_mean(&mut values, request.rolling_window);
            }
            if request.normalize_index {
                normalize_to_100(&mut values);
            }

            for (x, value) in axis.into_iter().zip(values) {
                frame.points.push(SeriesPoint {
                    x,
                    group: group_label.clone(),
                    series: series_name.clone(),
                    value,
                });
            }
        }
    }

    if frame.is_empty() {
        debug!(time_col = %request.time_col, "resample produced an empty series frame");
    }
    Ok(frame)
}

fn axis_values(dataset: &Dataset, column: &str, treat_as_time: bool) -> Vec<Option<AxisValue>> {
    let rows = dataset.num_rows();
    if treat_as_time {
        if let Some(timestamps) = dataset.timestamp_values_ms(column) {
            return timestamps.into_iter().map(|ms| ms.map(AxisValue::Time)).collect();
        }
        // Text (or anything else): parse per cell, coercing failures to null.
        return (0..rows)
            .map(|row| {
                dataset
                    .display_value(column, row)
                    .and_then(|text| parse_timestamp_ms(&text))
                    .map(AxisValue::Time)
            })
            .collect();
    }
    (0..rows)
        .map(|row| {
            dataset.cell_value(column, row).map(|cell| match cell {
                CellValue::Number(v) => AxisValue::Number(v),
                CellValue::Time(ms) => AxisValue::Time(ms),
                other => AxisValue::Text(other.to_string()),
            })
        })
        .collect()
}

fn cmp_axis_opt(a: &Option<AxisValue>, b: &Option<AxisValue>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => cmp_axis(a, b),
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
    }
}

fn cmp_axis(a: &AxisValue, b: &AxisValue) -> Ordering {
    match (a, b) {
        (AxisValue::Time(x), AxisValue::Time(y)) => x.cmp(y),
        (AxisValue::Number(x), AxisValue::Number(y)) => x.total_cmp(y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

/// Bucket a sorted series onto a regular calendar grid. Buckets between the
/// first and last observation with no data carry `None` so the fill policy
/// can close the gaps.
fn resample_series(
    series: &[(AxisValue, Option<f64>)],
    frequency: Frequency,
    stat: SeriesStat,
) -> Vec<(AxisValue, Option<f64>)> {
    let mut buckets: IndexMap<i64, Vec<f64>> = IndexMap::new();
    let mut bounds: Option<(i64, i64)> = None;

    for (x, value) in series {
        let AxisValue::Time(ms) = x else { continue };
        let Some(start) = bucket_start_ms(*ms, frequency) else { continue };
        bounds = Some(match bounds {
            Some((lo, hi)) => (lo.min(start), hi.max(start)),
            None => (start, start),
        });
        let bucket = buckets.entry(start).or_default();
        if let Some(v) = value {
            bucket.push(*v);
        }
    }

    let Some((first, last)) = bounds else { return Vec::new() };
    let mut out = Vec::new();
    let mut current = first;
    loop {
        let value = buckets.get(&current).and_then(|values| reduce_stat(values, stat));
        out.push((AxisValue::Time(current), value));
        if current >= last {
            break;
        }
        match next_bucket_ms(current, frequency) {
            Some(next) if next > current => current = next,
            _ => break,
        }
    }
    out
}

fn reduce_stat(values: &[f64], stat: SeriesStat) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(match stat {
        SeriesStat::Sum => values.iter().sum(),
        SeriesStat::Mean => stats::mean(values),
        SeriesStat::Median => stats::median(values),
        SeriesStat::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
        SeriesStat::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    })
}

fn bucket_start_ms(ms: i64, frequency: Frequency) -> Option<i64> {
    let date = DateTime::from_timestamp_millis(ms)?.date_naive();
    let start = match frequency {
        Frequency::None => return Some(ms),
        Frequency::Day => date,
        Frequency::Week => date - Duration::days(date.weekday().num_days_from_monday() as i64),
        Frequency::Month => date.with_day(1)?,
        Frequency::Quarter => {
            let month = (date.month0() / 3) * 3 + 1;
            NaiveDate::from_ymd_opt(date.year(), month, 1)?
        }
        Frequency::Year => NaiveDate::from_ymd_opt(date.year(), 1, 1)?,
    };
    Some(start.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis())
}

fn next_bucket_ms(ms: i64, frequency: Frequency) -> Option<i64> {
    let date = DateTime::from_timestamp_millis(ms)?.date_naive();
    let next = match frequency {
        Frequency::None => return None,
        Frequency::Day => date.checked_add_days(Days::new(1))?,
        Frequency::Week => date.checked_add_days(Days::new(7))?,
        Frequency::Month => date.checked_add_months(Months::new(1))?,
        Frequency::Quarter => date.checked_add_months(Months::new(3))?,
        Frequency::Year => NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)?,
    };
    Some(next.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis())
}

/// Carry the last valid value forward. Leading nulls stay null.
fn forward_fill(values: &mut [Option<f64>]) {
    let mut last = None;
    for value in values.iter_mut() {
        match value {
            Some(v) => last = Some(*v),
            None => *value = last,
        }
    }
}

/// Fill interior gaps by interpolation: time-proportional on a datetime
/// axis, ordinal otherwise. Leading nulls stay null; trailing nulls carry
/// the last valid value forward.
fn interpolate_gaps(axis: &[AxisValue], values: &mut [Option<f64>], temporal: bool) {
    let valid: Vec<usize> = values
        .iter()
        .enumerate()
        .filter_map(|(idx, value)| value.is_some().then_some(idx))
        .collect();
    let Some(&last_valid) = valid.last() else { return };

    for window in valid.windows(2) {
        let (lo, hi) = (window[0], window[1]);
        let (Some(v_lo), Some(v_hi)) = (values[lo], values[hi]) else { continue };
        for idx in lo + 1..hi {
            let t = gap_fraction(axis, lo, hi, idx, temporal);
            values[idx] = Some(v_lo + (v_hi - v_lo) * t);
        }
    }

    let tail = values[last_valid];
    for value in values.iter_mut().skip(last_valid + 1) {
        *value = tail;
    }
}

fn gap_fraction(axis: &[AxisValue], lo: usize, hi: usize, idx: usize, temporal: bool) -> f64 {
    if temporal {
        if let (AxisValue::Time(a), AxisValue::Time(b), AxisValue::Time(x)) =
            (&axis[lo], &axis[hi], &axis[idx])
        {
            let span = (b - a) as f64;
            if span != 0.0 {
                return (x - a) as f64 / span;
            }
        }
    }
    (idx - lo) as f64 / (hi - lo) as f64
}

/// Trailing moving average with a minimum window of one, skipping nulls.
fn rolling_mean(values: &mut [Option<f64>], window: usize) {
    let window = window.max(1);
    let source = values.to_vec();
    for idx in 0..values.len() {
        let from = idx.saturating_sub(window - 1);
        let in_window: Vec<f64> = source[from..=idx].iter().flatten().copied().collect();
        values[idx] = if in_window.is_empty() {
            None
        } else {
            Some(stats::mean(&in_window))
        };
    }
}

/// Index each series to 100 at its first valid value. Skipped entirely when
/// that value is zero, so no infinities can appear.
fn normalize_to_100(values: &mut [Option<f64>]) {
    let Some(first) = values.iter().flatten().next().copied() else { return };
    if first == 0.0 {
        return;
    }
    for value in values.iter_mut() {
        if let Some(v) = value.as_mut() {
            *v = *v / first * 100.0;
        }
    }
}
