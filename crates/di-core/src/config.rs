//! Chart configuration types
//!
//! Each chart type has its own tagged configuration struct. Invalid
//! combinations, like a value aggregation without a value column or a line
//! chart without series columns, are rejected when the configuration is
//! built, not when it is used. String-keyed dispatch from the UI layer ends
//! here: aggregations, palettes, color modes and sort keys are all
//! enumerated.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

pub type ChartId = Uuid;

/// Default mark color, matching the renderer's default blue.
pub const DEFAULT_MARK_COLOR: &str = "#4C78A8";

/// Errors raised while building or editing chart configurations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("aggregation '{0}' requires a value column")]
    MissingValueColumn(AggregateKind),

    #[error("chart limit reached ({0} charts)")]
    ChartLimit(usize),

    #[error("no such chart: {0}")]
    UnknownChart(ChartId),

    #[error("row limit must be at least 1")]
    ZeroRowLimit,

    #[error("select at least one series column")]
    NoSeriesColumns,
}

/// Aggregation function selector, as offered to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregateKind {
    Sum,
    Mean,
    Median,
    Min,
    Max,
    Count,
    NUnique,
}

impl AggregateKind {
    pub const ALL: [AggregateKind; 7] = [
        AggregateKind::Sum,
        AggregateKind::Mean,
        AggregateKind::Median,
        AggregateKind::Min,
        AggregateKind::Max,
        AggregateKind::Count,
        AggregateKind::NUnique,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateKind::Sum => "sum",
            AggregateKind::Mean => "mean",
            AggregateKind::Median => "median",
            AggregateKind::Min => "min",
            AggregateKind::Max => "max",
            AggregateKind::Count => "count",
            AggregateKind::NUnique => "nunique",
        }
    }

    /// Count is the only function that aggregates rows rather than a value
    /// column.
    pub fn requires_value(&self) -> bool {
        !matches!(self, AggregateKind::Count)
    }
}

impl fmt::Display for AggregateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully-resolved aggregation. Value-carrying variants own their value
/// column; `Count` has none, so the illegal "count of which column?" state
/// cannot be represented.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Aggregate {
    Count,
    Sum { value: String },
    Mean { value: String },
    Median { value: String },
    Min { value: String },
    Max { value: String },
    NUnique { value: String },
}

impl Aggregate {
    /// Build an aggregation from a user selection. Fails when a
    /// value-carrying function is chosen without a value column.
    pub fn new(kind: AggregateKind, value: Option<String>) -> Result<Self, ConfigError> {
        if kind == AggregateKind::Count {
            return Ok(Aggregate::Count);
        }
        let value = value.ok_or(ConfigError::MissingValueColumn(kind))?;
        Ok(match kind {
            AggregateKind::Sum => Aggregate::Sum { value },
            AggregateKind::Mean => Aggregate::Mean { value },
            AggregateKind::Median => Aggregate::Median { value },
            AggregateKind::Min => Aggregate::Min { value },
            AggregateKind::Max => Aggregate::Max { value },
            AggregateKind::NUnique => Aggregate::NUnique { value },
            AggregateKind::Count => Aggregate::Count,
        })
    }

    pub fn kind(&self) -> AggregateKind {
        match self {
            Aggregate::Count => AggregateKind::Count,
            Aggregate::Sum { .. } => AggregateKind::Sum,
            Aggregate::Mean { .. } => AggregateKind::Mean,
            Aggregate::Median { .. } => AggregateKind::Median,
            Aggregate::Min { .. } => AggregateKind::Min,
            Aggregate::Max { .. } => AggregateKind::Max,
            Aggregate::NUnique { .. } => AggregateKind::NUnique,
        }
    }

    pub fn value_column(&self) -> Option<&str> {
        match self {
            Aggregate::Count => None,
            Aggregate::Sum { value }
            | Aggregate::Mean { value }
            | Aggregate::Median { value }
            | Aggregate::Min { value }
            | Aggregate::Max { value }
            | Aggregate::NUnique { value } => Some(value),
        }
    }

    /// Label for default axis titles: "sum(sales)", "count", "nunique".
    pub fn label(&self) -> String {
        match self {
            Aggregate::Count => "count".to_string(),
            Aggregate::NUnique { .. } => "nunique".to_string(),
            other => format!(
                "{}({})",
                other.kind(),
                other.value_column().unwrap_or_default()
            ),
        }
    }
}

/// Sort key for grouped results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortKey {
    Value,
    Group,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn is_ascending(&self) -> bool {
        matches!(self, SortDirection::Ascending)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    Vertical,
    Horizontal,
}

/// Discrete color schemes offered for categorical encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscretePalette {
    Tableau10,
    Category10,
    Set2,
    Set3,
    Paired,
    Pastel1,
    Pastel2,
}

impl DiscretePalette {
    pub fn scheme_name(&self) -> &'static str {
        match self {
            DiscretePalette::Tableau10 => "tableau10",
            DiscretePalette::Category10 => "category10",
            DiscretePalette::Set2 => "set2",
            DiscretePalette::Set3 => "set3",
            DiscretePalette::Paired => "paired",
            DiscretePalette::Pastel1 => "pastel1",
            DiscretePalette::Pastel2 => "pastel2",
        }
    }
}

/// Continuous color schemes offered for value encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContinuousPalette {
    Viridis,
    Plasma,
    Magma,
    Inferno,
    Blues,
    Greens,
    Reds,
    Purples,
}

impl ContinuousPalette {
    pub fn scheme_name(&self) -> &'static str {
        match self {
            ContinuousPalette::Viridis => "viridis",
            ContinuousPalette::Plasma => "plasma",
            ContinuousPalette::Magma => "magma",
            ContinuousPalette::Inferno => "inferno",
            ContinuousPalette::Blues => "blues",
            ContinuousPalette::Greens => "greens",
            ContinuousPalette::Reds => "reds",
            ContinuousPalette::Purples => "purples",
        }
    }
}

/// How marks are colored. A single fixed color never shows a legend; the
/// palette modes carry their own legend toggles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColorMode {
    Single { color: String },
    ByCategory { palette: DiscretePalette, reverse: bool, legend: bool },
    ByValue { palette: ContinuousPalette, reverse: bool, legend: bool },
}

impl ColorMode {
    pub fn shows_legend(&self) -> bool {
        match self {
            ColorMode::Single { .. } => false,
            ColorMode::ByCategory { legend, .. } | ColorMode::ByValue { legend, .. } => *legend,
        }
    }
}

impl Default for ColorMode {
    fn default() -> Self {
        ColorMode::Single { color: DEFAULT_MARK_COLOR.to_string() }
    }
}

/// Resampling frequency for a datetime axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Frequency {
    None,
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::None => "none",
            Frequency::Day => "D",
            Frequency::Week => "W",
            Frequency::Month => "M",
            Frequency::Quarter => "Q",
            Frequency::Year => "Y",
        }
    }
}

/// Statistic applied per resample bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeriesStat {
    Sum,
    Mean,
    Median,
    Min,
    Max,
}

/// How missing values on a series are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissingPolicy {
    Drop,
    ForwardFill,
    Interpolate,
}

/// Bar chart over one grouping column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarChartConfig {
    pub id: ChartId,
    pub x_col: String,
    pub aggregate: Aggregate,
    pub sort_by: SortKey,
    pub direction: SortDirection,
    pub top_n: usize,
    pub remove_nulls: bool,
    pub title: Option<String>,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub orientation: Orientation,
    pub show_labels: bool,
    pub x_label_angle: i32,
    pub log_scale: bool,
    pub color: ColorMode,
}

impl BarChartConfig {
    pub fn new(x_col: impl Into<String>, aggregate: Aggregate) -> Self {
        Self {
            id: Uuid::new_v4(),
            x_col: x_col.into(),
            aggregate,
            sort_by: SortKey::Value,
            direction: SortDirection::Descending,
            top_n: 20,
            remove_nulls: true,
            title: None,
            x_label: None,
            y_label: None,
            orientation: Orientation::Vertical,
            show_labels: false,
            x_label_angle: 0,
            log_scale: false,
            color: ColorMode::default(),
        }
    }
}

/// Line chart over one x axis and one or more numeric series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineChartConfig {
    pub id: ChartId,
    pub x_col: String,
    pub y_cols: Vec<String>,
    pub group_col: Option<String>,
    pub treat_as_time: bool,
    pub frequency: Frequency,
    pub stat: SeriesStat,
    pub missing: MissingPolicy,
    pub rolling_window: usize,
    pub normalize_index: bool,
    pub top_n_groups: usize,
    pub orientation: Orientation,
    pub show_markers: bool,
    pub area_fill: bool,
    pub log_scale: bool,
    pub palette: DiscretePalette,
    pub reverse_palette: bool,
    pub show_legend: bool,
    pub title: Option<String>,
}

impl LineChartConfig {
    pub fn new(x_col: impl Into<String>, y_cols: Vec<String>) -> Result<Self, ConfigError> {
        if y_cols.is_empty() {
            return Err(ConfigError::NoSeriesColumns);
        }
        Ok(Self {
            id: Uuid::new_v4(),
            x_col: x_col.into(),
            y_cols,
            group_col: None,
            treat_as_time: false,
            frequency: Frequency::None,
            stat: SeriesStat::Sum,
            missing: MissingPolicy::ForwardFill,
            rolling_window: 0,
            normalize_index: false,
            top_n_groups: 10,
            orientation: Orientation::Vertical,
            show_markers: false,
            area_fill: false,
            log_scale: false,
            palette: DiscretePalette::Tableau10,
            reverse_palette: false,
            show_legend: true,
            title: None,
        })
    }
}

/// Point color for scatter plots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PointColor {
    Fixed { color: String },
    ByCategory { column: String, palette: DiscretePalette, reverse: bool },
    ByValue { column: String, palette: ContinuousPalette, reverse: bool },
}

impl PointColor {
    pub fn column(&self) -> Option<&str> {
        match self {
            PointColor::Fixed { .. } => None,
            PointColor::ByCategory { column, .. } | PointColor::ByValue { column, .. } => {
                Some(column)
            }
        }
    }
}

/// Point sizing for scatter plots. Areas are in square pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PointSize {
    Fixed { area: f64 },
    ByColumn { column: String, range: (f64, f64) },
}

/// Optional trendline overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Trendline {
    None,
    Linear { per_group: bool },
    Loess { per_group: bool, bandwidth: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterChartConfig {
    pub id: ChartId,
    pub x_col: String,
    pub y_col: String,
    pub treat_x_as_time: bool,
    /// 0 = plot every row.
    pub sample_rows: usize,
    pub color: PointColor,
    pub size: PointSize,
    pub facet_col: Option<String>,
    pub jitter: bool,
    pub x_log: bool,
    pub y_log: bool,
    pub opacity: f64,
    pub trendline: Trendline,
    pub show_legend: bool,
    pub title: Option<String>,
}

impl ScatterChartConfig {
    pub fn new(x_col: impl Into<String>, y_col: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            x_col: x_col.into(),
            y_col: y_col.into(),
            treat_x_as_time: false,
            sample_rows: 5000,
            color: PointColor::Fixed { color: DEFAULT_MARK_COLOR.to_string() },
            size: PointSize::Fixed { area: 60.0 },
            facet_col: None,
            jitter: false,
            x_log: false,
            y_log: false,
            opacity: 0.75,
            trendline: Trendline::None,
            show_legend: true,
            title: None,
        }
    }
}

/// Chart style for the distribution view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistributionStyle {
    /// Pick bar vs histogram from the column's classification.
    Auto,
    Bar,
    Histogram,
}

/// Histogram y-axis normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistogramNorm {
    Count,
    Density,
    Percent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionConfig {
    pub id: ChartId,
    pub column: String,
    pub low_card_threshold: usize,
    pub drop_nulls: bool,
    pub style: DistributionStyle,
    /// Bar branch: sorting and truncation of value counts.
    pub sort_by: SortKey,
    pub direction: SortDirection,
    pub top_n: usize,
    pub color: ColorMode,
    /// Histogram branch.
    pub bins: Option<usize>,
    pub norm: HistogramNorm,
    /// Percentile clipping applied before binning, e.g. (1.0, 99.0).
    pub winsorize: Option<(f64, f64)>,
    pub density_overlay: bool,
    pub rug: bool,
    pub bar_color: String,
    pub density_color: String,
}

impl DistributionConfig {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            column: column.into(),
            low_card_threshold: 30,
            drop_nulls: true,
            style: DistributionStyle::Auto,
            sort_by: SortKey::Value,
            direction: SortDirection::Descending,
            top_n: 20,
            color: ColorMode::default(),
            bins: None,
            norm: HistogramNorm::Count,
            winsorize: None,
            density_overlay: true,
            rug: false,
            bar_color: DEFAULT_MARK_COLOR.to_string(),
            density_color: "#333333".to_string(),
        }
    }
}

/// One configured chart instance. The session owns an ordered list of these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChartConfig {
    Bar(BarChartConfig),
    Line(LineChartConfig),
    Scatter(ScatterChartConfig),
    Distribution(DistributionConfig),
}

impl ChartConfig {
    pub fn id(&self) -> ChartId {
        match self {
            ChartConfig::Bar(config) => config.id,
            ChartConfig::Line(config) => config.id,
            ChartConfig::Scatter(config) => config.id,
            ChartConfig::Distribution(config) => config.id,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            ChartConfig::Bar(_) => "bar",
            ChartConfig::Line(_) => "line",
            ChartConfig::Scatter(_) => "scatter",
            ChartConfig::Distribution(_) => "distribution",
        }
    }

    /// Deep, independent copy with a fresh id. Edits to the copy never
    /// touch the original.
    pub fn duplicate(&self) -> Self {
        let mut copy = self.clone();
        let id = Uuid::new_v4();
        match &mut copy {
            ChartConfig::Bar(config) => config.id = id,
            ChartConfig::Line(config) => config.id = id,
            ChartConfig::Scatter(config) => config.id = id,
            ChartConfig::Distribution(config) => config.id = id,
        }
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_requires_value_column() {
        let err = Aggregate::new(AggregateKind::Sum, None).unwrap_err();
        assert_eq!(err, ConfigError::MissingValueColumn(AggregateKind::Sum));
        assert_eq!(Aggregate::new(AggregateKind::Count, None).unwrap(), Aggregate::Count);
    }

    #[test]
    fn test_aggregate_labels() {
        let sum = Aggregate::new(AggregateKind::Sum, Some("sales".into())).unwrap();
        assert_eq!(sum.label(), "sum(sales)");
        assert_eq!(Aggregate::Count.label(), "count");
        let nunique = Aggregate::new(AggregateKind::NUnique, Some("sku".into())).unwrap();
        assert_eq!(nunique.label(), "nunique");
    }

    #[test]
    fn test_single_color_never_shows_legend() {
        let single = ColorMode::Single { color: "#ff0000".into() };
        assert!(!single.shows_legend());
        let by_cat = ColorMode::ByCategory {
            palette: DiscretePalette::Set2,
            reverse: false,
            legend: true,
        };
        assert!(by_cat.shows_legend());
    }

    #[test]
    fn test_duplicate_is_independent() {
        let mut original = BarChartConfig::new("region", Aggregate::Count);
        original.color = ColorMode::ByCategory {
            palette: DiscretePalette::Tableau10,
            reverse: false,
            legend: true,
        };
        let config = ChartConfig::Bar(original.clone());
        let copy = config.duplicate();
        assert_ne!(config.id(), copy.id());

        // Mutating the copy's nested fields must not alter the original.
        let ChartConfig::Bar(mut copied) = copy else { unreachable!() };
        copied.color = ColorMode::ByValue {
            palette: ContinuousPalette::Viridis,
            reverse: true,
            legend: false,
        };
        copied.top_n = 5;
        assert_eq!(original.top_n, 20);
        assert!(matches!(original.color, ColorMode::ByCategory { .. }));
    }

    #[test]
    fn test_line_config_needs_series() {
        assert_eq!(
            LineChartConfig::new("date", vec![]).unwrap_err(),
            ConfigError::NoSeriesColumns
        );
        assert!(LineChartConfig::new("date", vec!["sales".into()]).is_ok());
    }
}
