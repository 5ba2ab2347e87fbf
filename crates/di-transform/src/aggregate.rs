//! Grouped aggregation
//!
//! Groups a dataset by one column's distinct values and reduces an optional
//! value column per group. Nulls form their own group unless removed up
//! front. Results are sorted (by aggregated value or by group key) before
//! top-N truncation, so a truncated result never skips a higher-ranked row.

use std::cmp::Ordering;

use ahash::AHashSet;
use indexmap::IndexMap;

use di_core::config::{Aggregate, ConfigError, SortDirection, SortKey};
use di_core::Dataset;

use crate::{stats, TransformError};

/// One grouped-aggregation request.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationRequest {
    pub group_by: String,
    pub aggregate: Aggregate,
    /// Drop rows with a null group key (and null value, for value-carrying
    /// aggregations) before grouping.
    pub remove_nulls: bool,
    pub sort_by: SortKey,
    pub direction: SortDirection,
    pub top_n: usize,
}

impl AggregationRequest {
    pub fn new(group_by: impl Into<String>, aggregate: Aggregate) -> Self {
        Self {
            group_by: group_by.into(),
            aggregate,
            remove_nulls: true,
            sort_by: SortKey::Value,
            direction: SortDirection::Descending,
            top_n: 20,
        }
    }
}

/// A group's key. The null group renders as "null"; numeric keys remember
/// their value so group-sorted output orders them numerically.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupKey {
    label: Option<String>,
    numeric: Option<f64>,
}

impl GroupKey {
    pub fn null() -> Self {
        Self { label: None, numeric: None }
    }

    pub fn text(label: impl Into<String>) -> Self {
        Self { label: Some(label.into()), numeric: None }
    }

    pub fn number(value: f64, label: impl Into<String>) -> Self {
        Self { label: Some(label.into()), numeric: Some(value) }
    }

    pub fn is_null(&self) -> bool {
        self.label.is_none()
    }

    pub fn numeric(&self) -> Option<f64> {
        self.numeric
    }

    pub fn display(&self) -> &str {
        self.label.as_deref().unwrap_or("null")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupedRow {
    pub key: GroupKey,
    pub value: f64,
}

/// Ordered (group key, aggregated value) pairs. Keys are unique.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedResult {
    pub group_column: String,
    /// Label of the aggregated value, e.g. "sum(sales)" or "count".
    pub value_label: String,
    pub rows: Vec<GroupedRow>,
}

impl GroupedResult {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

#[derive(Default)]
struct GroupAccumulator {
    numeric_key: Option<f64>,
    count: usize,
    values: Vec<f64>,
    distinct: AHashSet<String>,
}

/// Run one aggregation request against the dataset.
pub fn aggregate(dataset: &Dataset, request: &AggregationRequest) -> Result<GroupedResult, TransformError> {
    if request.top_n == 0 {
        return Err(ConfigError::ZeroRowLimit.into());
    }
    if dataset.column(&request.group_by).is_none() {
        return Err(TransformError::MissingColumn(request.group_by.clone()));
    }

    // Value extraction depends on the aggregation variant: nunique works on
    // any column type, the numeric reducers require a numeric column.
    let value_column = request.aggregate.value_column();
    let numeric_values = match &request.aggregate {
        Aggregate::Count | Aggregate::NUnique { .. } => None,
        _ => {
            let column = value_column.unwrap_or_default();
            if dataset.column(column).is_none() {
                return Err(TransformError::MissingColumn(column.to_string()));
            }
            Some(
                dataset
                    .numeric_values(column)
                    .ok_or_else(|| TransformError::NotNumeric(column.to_string()))?,
            )
        }
    };
    if let Aggregate::NUnique { value } = &request.aggregate {
        if dataset.column(value).is_none() {
            return Err(TransformError::MissingColumn(value.clone()));
        }
    }

    let mut groups: IndexMap<Option<String>, GroupAccumulator> = IndexMap::new();
    for row in 0..dataset.num_rows() {
        let key_cell = dataset.cell_value(&request.group_by, row);
        if key_cell.is_none() && request.remove_nulls {
            continue;
        }

        let value = numeric_values.as_ref().map(|values| values[row]);
        let distinct_cell = match &request.aggregate {
            Aggregate::NUnique { value } => dataset.display_value(value, row),
            _ => None,
        };
        // For value-carrying aggregations, null removal also applies to the
        // value side.
        if request.remove_nulls {
            match &request.aggregate {
                Aggregate::Count => {}
                Aggregate::NUnique { .. } => {
                    if distinct_cell.is_none() {
                        continue;
                    }
                }
                _ => {
                    if value == Some(None) {
                        continue;
                    }
                }
            }
        }

        let numeric_key = key_cell.as_ref().and_then(|cell| cell.as_f64());
        let label = key_cell.map(|cell| cell.to_string());
        let entry = groups.entry(label).or_default();
        entry.numeric_key = entry.numeric_key.or(numeric_key);
        entry.count += 1;
        if let Some(Some(v)) = value {
            entry.values.push(v);
        }
        if let Some(text) = distinct_cell {
            entry.distinct.insert(text);
        }
    }

    let mut rows: Vec<GroupedRow> = groups
        .into_iter()
        .map(|(label, acc)| {
            let key = match (label, acc.numeric_key) {
                (Some(label), Some(numeric)) => GroupKey::number(numeric, label),
                (Some(label), None) => GroupKey::text(label),
                (None, _) => GroupKey::null(),
            };
            let value = reduce(&request.aggregate, &acc);
            GroupedRow { key, value }
        })
        .collect();

    rows.sort_by(|a, b| compare_rows(a, b, request.sort_by, request.direction));
    rows.truncate(request.top_n);

    Ok(GroupedResult {
        group_column: request.group_by.clone(),
        value_label: request.aggregate.label(),
        rows,
    })
}

fn reduce(aggregate: &Aggregate, acc: &GroupAccumulator) -> f64 {
    match aggregate {
        Aggregate::Count => acc.count as f64,
        Aggregate::NUnique { .. } => acc.distinct.len() as f64,
        Aggregate::Sum { .. } => acc.values.iter().sum(),
        Aggregate::Mean { .. } => stats::mean(&acc.values),
        Aggregate::Median { .. } => stats::median(&acc.values),
        Aggregate::Min { .. } => acc.values.iter().copied().fold(f64::NAN, f64::min),
        Aggregate::Max { .. } => acc.values.iter().copied().fold(f64::NAN, f64::max),
    }
}

fn compare_rows(a: &GroupedRow, b: &GroupedRow, sort_by: SortKey, direction: SortDirection) -> Ordering {
    match sort_by {
        SortKey::Value => match (a.value.is_nan(), b.value.is_nan()) {
            // NaN sorts last regardless of direction.
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => directed(a.value.total_cmp(&b.value), direction),
        },
        SortKey::Group => {
            // Numeric keys compare by value; everything else by string.
            let ordering = match (a.key.numeric(), b.key.numeric()) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                _ => a.key.display().cmp(b.key.display()),
            };
            directed(ordering, direction)
        }
    }
}

fn directed(ordering: Ordering, direction: SortDirection) -> Ordering {
    if direction.is_ascending() {
        ordering
    } else {
        ordering.reverse()
    }
}

/// Per-value counts for one column, with percentages of the (post-removal)
/// total.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueCountRow {
    pub key: GroupKey,
    pub count: usize,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValueCounts {
    pub column: String,
    pub rows: Vec<ValueCountRow>,
}

impl ValueCounts {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub fn value_counts(
    dataset: &Dataset,
    column: &str,
    drop_nulls: bool,
    sort_by: SortKey,
    direction: SortDirection,
    top_n: usize,
) -> Result<ValueCounts, TransformError> {
    if top_n == 0 {
        return Err(ConfigError::ZeroRowLimit.into());
    }
    let request = AggregationRequest {
        group_by: column.to_string(),
        aggregate: Aggregate::Count,
        remove_nulls: drop_nulls,
        sort_by,
        direction,
        top_n: usize::MAX,
    };
    let grouped = aggregate(dataset, &request)?;

    let total: f64 = grouped.rows.iter().map(|row| row.value).sum();
    let mut rows: Vec<ValueCountRow> = grouped
        .rows
        .into_iter()
        .map(|row| ValueCountRow {
            key: row.key,
            count: row.value as usize,
            percent: if total > 0.0 {
                (row.value / total * 10_000.0).round() / 100.0
            } else {
                0.0
            },
        })
        .collect();

    rows.truncate(top_n);
    Ok(ValueCounts { column: column.to_string(), rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
    use di_core::config::AggregateKind;
    use std::sync::Arc;

    fn sales_dataset() -> Dataset {
        Dataset::from_columns(
            "sales",
            vec![
                (
                    "region",
                    Arc::new(StringArray::from(vec![Some("North"), Some("South"), Some("North")]))
                        as ArrayRef,
                ),
                (
                    "sales",
                    Arc::new(Float64Array::from(vec![Some(10.0), Some(20.0), Some(30.0)])) as ArrayRef,
                ),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_sum_by_region() {
        let dataset = sales_dataset();
        let request = AggregationRequest::new(
            "region",
            Aggregate::new(AggregateKind::Sum, Some("sales".into())).unwrap(),
        );
        let result = aggregate(&dataset, &request).unwrap();

        // Default sort: by value, descending.
        assert_eq!(result.value_label, "sum(sales)");
        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.rows[0].key.display(), "North");
        assert_eq!(result.rows[0].value, 40.0);
        assert_eq!(result.rows[1].key.display(), "South");
        assert_eq!(result.rows[1].value, 20.0);
    }

    #[test]
    fn test_count_totals_match_rows_considered() {
        let dataset = Dataset::from_columns(
            "t",
            vec![(
                "k",
                Arc::new(StringArray::from(vec![Some("a"), Some("b"), None, Some("a")])) as ArrayRef,
            )],
        )
        .unwrap();

        let mut request = AggregationRequest::new("k", Aggregate::Count);
        request.remove_nulls = true;
        let kept = aggregate(&dataset, &request).unwrap();
        let total: f64 = kept.rows.iter().map(|row| row.value).sum();
        assert_eq!(total, 3.0);

        request.remove_nulls = false;
        let with_nulls = aggregate(&dataset, &request).unwrap();
        let total: f64 = with_nulls.rows.iter().map(|row| row.value).sum();
        assert_eq!(total, 4.0);
        assert!(with_nulls.rows.iter().any(|row| row.key.is_null()));
    }

    #[test]
    fn test_aggregator_is_idempotent() {
        let dataset = sales_dataset();
        let request = AggregationRequest::new(
            "region",
            Aggregate::new(AggregateKind::Mean, Some("sales".into())).unwrap(),
        );
        let first = aggregate(&dataset, &request).unwrap();
        let second = aggregate(&dataset, &request).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_top_n_respects_sort_order() {
        let dataset = Dataset::from_columns(
            "t",
            vec![
                (
                    "k",
                    Arc::new(StringArray::from(vec!["a", "b", "c", "d"])) as ArrayRef,
                ),
                (
                    "v",
                    Arc::new(Float64Array::from(vec![4.0, 1.0, 3.0, 2.0])) as ArrayRef,
                ),
            ],
        )
        .unwrap();

        let mut request = AggregationRequest::new(
            "k",
            Aggregate::new(AggregateKind::Sum, Some("v".into())).unwrap(),
        );
        request.top_n = 2;
        let result = aggregate(&dataset, &request).unwrap();
        let values: Vec<f64> = result.rows.iter().map(|row| row.value).collect();
        assert_eq!(values, vec![4.0, 3.0]);
    }

    #[test]
    fn test_numeric_group_keys_sort_by_value() {
        let dataset = Dataset::from_columns(
            "t",
            vec![(
                "k",
                Arc::new(Int64Array::from(vec![10, 2, 2, 10, 1])) as ArrayRef,
            )],
        )
        .unwrap();

        let mut request = AggregationRequest::new("k", Aggregate::Count);
        request.sort_by = SortKey::Group;
        request.direction = SortDirection::Ascending;
        let result = aggregate(&dataset, &request).unwrap();
        let keys: Vec<&str> = result.rows.iter().map(|row| row.key.display()).collect();
        // Numeric order, not lexicographic ("10" < "2" as strings).
        assert_eq!(keys, vec!["1", "2", "10"]);
    }

    #[test]
    fn test_nunique() {
        let dataset = Dataset::from_columns(
            "t",
            vec![
                (
                    "k",
                    Arc::new(StringArray::from(vec!["a", "a", "a", "b"])) as ArrayRef,
                ),
                (
                    "v",
                    Arc::new(StringArray::from(vec![Some("x"), Some("y"), Some("x"), None]))
                        as ArrayRef,
                ),
            ],
        )
        .unwrap();

        let request = AggregationRequest::new(
            "k",
            Aggregate::new(AggregateKind::NUnique, Some("v".into())).unwrap(),
        );
        let result = aggregate(&dataset, &request).unwrap();
        assert_eq!(result.rows[0].key.display(), "a");
        assert_eq!(result.rows[0].value, 2.0);
        // The null-valued "b" row was removed entirely.
        assert_eq!(result.rows.len(), 1);
    }

    #[test]
    fn test_missing_and_non_numeric_columns() {
        let dataset = sales_dataset();
        let request = AggregationRequest::new(
            "region",
            Aggregate::new(AggregateKind::Sum, Some("nope".into())).unwrap(),
        );
        assert_eq!(
            aggregate(&dataset, &request).unwrap_err(),
            TransformError::MissingColumn("nope".into())
        );

        let request = AggregationRequest::new(
            "region",
            Aggregate::new(AggregateKind::Sum, Some("region".into())).unwrap(),
        );
        assert_eq!(
            aggregate(&dataset, &request).unwrap_err(),
            TransformError::NotNumeric("region".into())
        );
    }

    #[test]
    fn test_zero_row_limit_rejected() {
        let dataset = sales_dataset();
        let mut request = AggregationRequest::new("region", Aggregate::Count);
        request.top_n = 0;
        assert_eq!(
            aggregate(&dataset, &request).unwrap_err(),
            TransformError::Config(ConfigError::ZeroRowLimit)
        );
    }

    #[test]
    fn test_value_counts_percent() {
        let dataset = Dataset::from_columns(
            "t",
            vec![(
                "k",
                Arc::new(StringArray::from(vec!["a", "a", "a", "b"])) as ArrayRef,
            )],
        )
        .unwrap();

        let counts =
            value_counts(&dataset, "k", true, SortKey::Value, SortDirection::Descending, 20).unwrap();
        assert_eq!(counts.rows[0].count, 3);
        assert_eq!(counts.rows[0].percent, 75.0);
        assert_eq!(counts.rows[1].percent, 25.0);
    }
}
