//! Bar chart specification

use serde_json::{json, Map, Value};

use di_core::config::{BarChartConfig, ColorMode, Orientation};
use di_transform::GroupedResult;

use crate::spec::{number_or_null, scale_object, ChartSpec, VEGA_LITE_SCHEMA};

/// Build the declarative spec for one bar chart over an aggregated result.
pub fn bar_chart_spec(config: &BarChartConfig, grouped: &GroupedResult) -> ChartSpec {
    let values: Vec<Value> = grouped
        .rows
        .iter()
        .map(|row| {
            let key = if row.key.is_null() {
                Value::Null
            } else if let Some(numeric) = row.key.numeric() {
                number_or_null(numeric)
            } else {
                Value::from(row.key.display())
            };
            let mut row_obj = Map::new();
            row_obj.insert(grouped.group_column.clone(), key);
            row_obj.insert("value".to_string(), number_or_null(row.value));
            Value::Object(row_obj)
        })
        .collect();

    let x_title = config.x_label.clone().unwrap_or_else(|| config.x_col.clone());
    let y_title = config.y_label.clone().unwrap_or_else(|| grouped.value_label.clone());
    let title = config.title.clone().unwrap_or_else(|| {
        format!("{} by {} (Top {})", grouped.value_label, config.x_col, config.top_n)
    });

    let category = json!({
        "field": grouped.group_column,
        "type": "nominal",
        "title": x_title,
        "axis": { "labelAngle": config.x_label_angle },
        "sort": null,
    });
    let value = json!({
        "field": "value",
        "type": "quantitative",
        "title": y_title,
        "scale": scale_object(config.log_scale),
    });

    // Horizontal bars put the value on x and the category on y.
    let (x_enc, y_enc) = match config.orientation {
        Orientation::Vertical => (category, value),
        Orientation::Horizontal => (value, category),
    };

    let mut encoding = Map::new();
    encoding.insert("x".to_string(), x_enc.clone());
    encoding.insert("y".to_string(), y_enc.clone());
    encoding.insert(
        "tooltip".to_string(),
        json!([
            { "field": grouped.group_column, "type": "nominal", "title": config.x_col },
            { "field": "value", "type": "quantitative", "title": y_title },
        ]),
    );

    let mark = match &config.color {
        ColorMode::Single { color } => json!({ "type": "bar", "color": color }),
        _ => json!({ "type": "bar" }),
    };
    match &config.color {
        ColorMode::Single { .. } => {}
        ColorMode::ByCategory { palette, reverse, legend } => {
            encoding.insert(
                "color".to_string(),
                json!({
                    "field": grouped.group_column,
                    "type": "nominal",
                    "scale": { "scheme": palette.scheme_name(), "reverse": reverse },
                    "legend": if *legend { json!({}) } else { Value::Null },
                }),
            );
        }
        ColorMode::ByValue { palette, reverse, legend } => {
            encoding.insert(
                "color".to_string(),
                json!({
                    "field": "value",
                    "type": "quantitative",
                    "scale": { "scheme": palette.scheme_name(), "reverse": reverse },
                    "legend": if *legend { json!({}) } else { Value::Null },
                }),
            );
        }
    }

    let root = if config.show_labels {
        // Text labels stay uncolored for readability.
        let text_mark = match config.orientation {
            Orientation::Vertical => json!({ "type": "text", "dy": -6 }),
            Orientation::Horizontal => json!({ "type": "text", "dx": 6, "align": "left" }),
        };
        json!({
            "$schema": VEGA_LITE_SCHEMA,
            "title": title,
            "height": 360,
            "data": { "values": values },
            "layer": [
                { "mark": mark, "encoding": Value::Object(encoding) },
                {
                    "mark": text_mark,
                    "encoding": {
                        "x": x_enc,
                        "y": y_enc,
                        "text": { "field": "value", "type": "quantitative" },
                    },
                },
            ],
        })
    } else {
        json!({
            "$schema": VEGA_LITE_SCHEMA,
            "title": title,
            "height": 360,
            "data": { "values": values },
            "mark": mark,
            "encoding": Value::Object(encoding),
        })
    };

    ChartSpec::from_value(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use di_core::config::{Aggregate, AggregateKind, ContinuousPalette, SortDirection};
    use di_transform::aggregate::{GroupKey, GroupedRow};

    fn grouped() -> GroupedResult {
        GroupedResult {
            group_column: "region".to_string(),
            value_label: "sum(sales)".to_string(),
            rows: vec![
                GroupedRow { key: GroupKey::text("North"), value: 40.0 },
                GroupedRow { key: GroupKey::text("South"), value: 20.0 },
            ],
        }
    }

    fn config() -> BarChartConfig {
        BarChartConfig::new(
            "region",
            Aggregate::new(AggregateKind::Sum, Some("sales".into())).unwrap(),
        )
    }

    #[test]
    fn test_default_title_pattern() {
        let spec = bar_chart_spec(&config(), &grouped());
        assert_eq!(spec.as_value()["title"], "sum(sales) by region (Top 20)");
    }

    #[test]
    fn test_single_color_binds_mark_and_hides_legend() {
        let spec = bar_chart_spec(&config(), &grouped());
        let root = spec.as_value();
        assert_eq!(root["mark"]["color"], "#4C78A8");
        assert!(root["encoding"].get("color").is_none());
    }

    #[test]
    fn test_by_value_color_binds_value_field() {
        let mut config = config();
        config.color = ColorMode::ByValue {
            palette: ContinuousPalette::Viridis,
            reverse: false,
            legend: true,
        };
        let spec = bar_chart_spec(&config, &grouped());
        let color = &spec.as_value()["encoding"]["color"];
        assert_eq!(color["field"], "value");
        assert_eq!(color["scale"]["scheme"], "viridis");
    }

    #[test]
    fn test_horizontal_swaps_axes() {
        let mut config = config();
        config.orientation = Orientation::Horizontal;
        let spec = bar_chart_spec(&config, &grouped());
        let encoding = &spec.as_value()["encoding"];
        assert_eq!(encoding["x"]["field"], "value");
        assert_eq!(encoding["y"]["field"], "region");
    }

    #[test]
    fn test_labels_produce_layered_spec() {
        let mut config = config();
        config.show_labels = true;
        let spec = bar_chart_spec(&config, &grouped());
        let layers = spec.as_value()["layer"].as_array().unwrap();
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[1]["encoding"]["text"]["field"], "value");
    }

    #[test]
    fn test_sort_direction_is_reflected_in_data_order() {
        let mut result = grouped();
        result.rows.reverse();
        let mut config = config();
        config.direction = SortDirection::Ascending;
        let spec = bar_chart_spec(&config, &result);
        let values = spec.as_value()["data"]["values"].as_array().unwrap();
        assert_eq!(values[0]["value"], 20.0);
    }
}
