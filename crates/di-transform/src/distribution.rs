//! Distribution view preparation
//!
//! A column distributes either as a bar chart of value counts (categorical,
//! or low-cardinality numeric/datetime) or as a histogram (numeric). The
//! histogram path optionally winsorizes extremes before binning and carries
//! an extended describe() for the summary panel.

use di_core::config::{DistributionConfig, DistributionStyle};
use di_core::{ColumnKind, Dataset};

use crate::aggregate::{value_counts, ValueCounts};
use crate::profile::{default_bin_count, describe_series};
use crate::{stats, TransformError};

const SUMMARY_PERCENTILES: [f64; 7] = [0.01, 0.05, 0.25, 0.5, 0.75, 0.95, 0.99];

/// Prepared inputs for a histogram spec.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramPlan {
    pub column: String,
    /// Non-null (and possibly winsorized) values to bin.
    pub values: Vec<f64>,
    pub bins: usize,
    /// Extended describe() of the plotted values.
    pub summary: Vec<(String, f64)>,
}

/// The resolved shape of a distribution view.
#[derive(Debug, Clone, PartialEq)]
pub enum DistributionPlan {
    Bar(ValueCounts),
    Histogram(HistogramPlan),
}

/// The auto-mode rule: explicit categorical/boolean types always count;
/// numeric and datetime columns count when low-cardinality.
pub fn treat_as_categorical(
    dataset: &Dataset,
    column: &str,
    threshold: usize,
) -> Result<bool, TransformError> {
    let raw = dataset
        .raw_kind(column)
        .ok_or_else(|| TransformError::MissingColumn(column.to_string()))?;
    Ok(match raw {
        ColumnKind::Categorical | ColumnKind::Boolean => true,
        ColumnKind::Numeric | ColumnKind::Datetime => {
            dataset.distinct_count(column).unwrap_or(0) <= threshold
        }
        ColumnKind::Other => false,
    })
}

pub fn prepare_distribution(
    dataset: &Dataset,
    config: &DistributionConfig,
) -> Result<DistributionPlan, TransformError> {
    let categorical = match config.style {
        DistributionStyle::Auto => {
            treat_as_categorical(dataset, &config.column, config.low_card_threshold)?
        }
        DistributionStyle::Bar => true,
        DistributionStyle::Histogram => false,
    };

    if categorical {
        let counts = value_counts(
            dataset,
            &config.column,
            config.drop_nulls,
            config.sort_by,
            config.direction,
            config.top_n,
        )?;
        return Ok(DistributionPlan::Bar(counts));
    }

    let mut values: Vec<f64> = dataset
        .numeric_values(&config.column)
        .ok_or_else(|| TransformError::NotNumeric(config.column.clone()))?
        .into_iter()
        .flatten()
        .collect();
    if let Some((lower, upper)) = config.winsorize {
        values = stats::winsorize(&values, lower, upper);
    }

    let distinct = {
        let mut sorted = values.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));
        sorted.dedup();
        sorted.len()
    };
    let bins = config.bins.unwrap_or_else(|| default_bin_count(distinct));
    let summary = describe_series(&values, &SUMMARY_PERCENTILES);

    Ok(DistributionPlan::Histogram(HistogramPlan {
        column: config.column.clone(),
        values,
        bins,
        summary,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{ArrayRef, Float64Array, StringArray};
    use std::sync::Arc;

    fn dataset() -> Dataset {
        let values: Vec<f64> = (1..=200).map(|v| v as f64).collect();
        Dataset::from_columns(
            "t",
            vec![
                (
                    "grade",
                    Arc::new(StringArray::from(vec!["a"; 200])) as ArrayRef,
                ),
                ("score", Arc::new(Float64Array::from(values)) as ArrayRef),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_auto_mode_picks_by_column_kind() {
        let data = dataset();
        assert!(treat_as_categorical(&data, "grade", 30).unwrap());
        assert!(!treat_as_categorical(&data, "score", 30).unwrap());
        // Low-cardinality numeric flips to categorical.
        assert!(treat_as_categorical(&data, "score", 200).unwrap());
    }

    #[test]
    fn test_categorical_plan() {
        let data = dataset();
        let plan = prepare_distribution(&data, &DistributionConfig::new("grade")).unwrap();
        let DistributionPlan::Bar(counts) = plan else { panic!("expected bar plan") };
        assert_eq!(counts.rows.len(), 1);
        assert_eq!(counts.rows[0].count, 200);
    }

    #[test]
    fn test_histogram_plan_with_winsorize() {
        let data = dataset();
        let mut config = DistributionConfig::new("score");
        config.winsorize = Some((5.0, 95.0));
        let plan = prepare_distribution(&data, &config).unwrap();
        let DistributionPlan::Histogram(histogram) = plan else { panic!("expected histogram") };
        assert_eq!(histogram.values.len(), 200);
        let max = histogram.values.iter().copied().fold(f64::NAN, f64::max);
        assert!(max < 200.0);
        // sqrt rule, clamped: sqrt of the post-clip distinct count.
        assert!(histogram.bins >= 10 && histogram.bins <= 30);
        assert_eq!(histogram.summary[0], ("count".to_string(), 200.0));
    }

    #[test]
    fn test_explicit_style_overrides_auto() {
        let data = dataset();
        let mut config = DistributionConfig::new("score");
        config.style = DistributionStyle::Bar;
        assert!(matches!(
            prepare_distribution(&data, &config).unwrap(),
            DistributionPlan::Bar(_)
        ));
    }
}
