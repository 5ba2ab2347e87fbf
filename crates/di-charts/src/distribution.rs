//! Distribution specifications: categorical value counts and histograms

use serde_json::{json, Map, Value};

use di_core::config::{ColorMode, DistributionConfig, HistogramNorm};
use di_transform::aggregate::ValueCounts;
use di_transform::distribution::HistogramPlan;

use crate::spec::{number_or_null, ChartSpec, VEGA_LITE_SCHEMA};

/// Bar chart of per-value counts for a categorical column.
pub fn value_counts_spec(config: &DistributionConfig, counts: &ValueCounts) -> ChartSpec {
    let values: Vec<Value> = counts
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
            row_obj.insert(counts.column.clone(), key);
            row_obj.insert("count".to_string(), Value::from(row.count));
            row_obj.insert("percent".to_string(), Value::from(row.percent));
            Value::Object(row_obj)
        })
        .collect();

    let mut encoding = Map::new();
    encoding.insert(
        "x".to_string(),
        json!({
            "field": counts.column,
            "type": "nominal",
            "title": counts.column,
            "axis": { "labelAngle": 0 },
            "sort": null,
        }),
    );
    encoding.insert(
        "y".to_string(),
        json!({ "field": "count", "type": "quantitative", "title": "Count" }),
    );
    encoding.insert(
        "tooltip".to_string(),
        json!([
            { "field": counts.column, "type": "nominal", "title": counts.column },
            { "field": "count", "type": "quantitative", "title": "Count" },
            { "field": "percent", "type": "quantitative", "title": "Percent" },
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
                    "field": counts.column,
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
                    "field": "count",
                    "type": "quantitative",
                    "scale": { "scheme": palette.scheme_name(), "reverse": reverse },
                    "legend": if *legend { json!({}) } else { Value::Null },
                }),
            );
        }
    }

    ChartSpec::from_value(json!({
        "$schema": VEGA_LITE_SCHEMA,
        "title": format!("Value counts of {}", counts.column),
        "height": 360,
        "data": { "values": values },
        "mark": mark,
        "encoding": Value::Object(encoding),
    }))
}

/// Histogram of a numeric column, with optional density and rug layers.
pub fn histogram_spec(config: &DistributionConfig, plan: &HistogramPlan) -> ChartSpec {
    let values: Vec<Value> = plan
        .values
        .iter()
        .map(|v| {
            let mut row = Map::new();
            row.insert(plan.column.clone(), number_or_null(*v));
            Value::Object(row)
        })
        .collect();

    let histogram = match config.norm {
        HistogramNorm::Count | HistogramNorm::Density => json!({
            "mark": { "type": "bar", "color": config.bar_color },
            "encoding": {
                "x": {
                    "field": plan.column,
                    "type": "quantitative",
                    "bin": { "maxbins": plan.bins },
                    "title": plan.column,
                },
                "y": { "aggregate": "count", "type": "quantitative", "title": "Count" },
                "tooltip": [
                    {
                        "field": plan.column,
                        "type": "quantitative",
                        "bin": { "maxbins": plan.bins },
                        "title": "Range",
                    },
                    { "aggregate": "count", "type": "quantitative", "title": "Count" },
                ],
            },
        }),
        HistogramNorm::Percent => json!({
            "transform": [
                { "bin": { "maxbins": plan.bins }, "field": plan.column, "as": "binned" },
                {
                    "aggregate": [{ "op": "count", "as": "count" }],
                    "groupby": ["binned", "binned_end"],
                },
                { "joinaggregate": [{ "op": "sum", "field": "count", "as": "total" }] },
                { "calculate": "100 * datum.count / datum.total", "as": "percent" },
            ],
            "mark": { "type": "bar", "color": config.bar_color },
            "encoding": {
                "x": {
                    "field": "binned",
                    "bin": { "binned": true },
                    "type": "quantitative",
                    "title": plan.column,
                },
                "x2": { "field": "binned_end" },
                "y": { "field": "percent", "type": "quantitative", "title": "Percent" },
            },
        }),
    };

    let mut layers = vec![histogram];
    if config.density_overlay {
        layers.push(json!({
            "transform": [{ "density": plan.column, "as": [plan.column, "density"] }],
            "mark": { "type": "line", "stroke": config.density_color, "strokeWidth": 2 },
            "encoding": {
                "x": { "field": plan.column, "type": "quantitative" },
                "y": { "field": "density", "type": "quantitative" },
                "tooltip": [{ "field": "density", "type": "quantitative", "title": "Density" }],
            },
        }));
    }
    if config.rug {
        layers.push(json!({
            "mark": { "type": "tick", "opacity": 0.35, "thickness": 1 },
            "encoding": {
                "x": { "field": plan.column, "type": "quantitative" },
                "y": { "value": 0 },
            },
        }));
    }

    let title = format!("Histogram of {}", plan.column);
    let root = if layers.len() > 1 {
        json!({
            "$schema": VEGA_LITE_SCHEMA,
            "title": title,
            "height": 360,
            "data": { "values": values },
            "layer": layers,
        })
    } else {
        let mut root = json!({
            "$schema": VEGA_LITE_SCHEMA,
            "title": title,
            "height": 360,
            "data": { "values": values },
        });
        if let (Some(object), Some(layer)) = (root.as_object_mut(), layers[0].as_object()) {
            for (key, value) in layer {
                object.insert(key.clone(), value.clone());
            }
        }
        root
    };
    ChartSpec::from_value(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use di_transform::aggregate::{GroupKey, ValueCountRow};
    use di_transform::distribution::HistogramPlan;

    fn counts() -> ValueCounts {
        ValueCounts {
            column: "grade".to_string(),
            rows: vec![
                ValueCountRow { key: GroupKey::text("a"), count: 3, percent: 75.0 },
                ValueCountRow { key: GroupKey::text("b"), count: 1, percent: 25.0 },
            ],
        }
    }

    #[test]
    fn test_value_counts_tooltip_has_percent() {
        let config = DistributionConfig::new("grade");
        let spec = value_counts_spec(&config, &counts());
        let tooltip = spec.as_value()["encoding"]["tooltip"].as_array().unwrap();
        assert_eq!(tooltip[2]["field"], "percent");
        assert_eq!(spec.as_value()["title"], "Value counts of grade");
    }

    fn plan() -> HistogramPlan {
        HistogramPlan {
            column: "score".to_string(),
            values: vec![1.0, 2.0, 3.0],
            bins: 10,
            summary: vec![("count".to_string(), 3.0)],
        }
    }

    #[test]
    fn test_histogram_with_density_is_layered() {
        let mut config = DistributionConfig::new("score");
        config.density_overlay = true;
        let spec = histogram_spec(&config, &plan());
        let layers = spec.as_value()["layer"].as_array().unwrap();
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[1]["transform"][0]["density"], "score");
    }

    #[test]
    fn test_histogram_without_overlays_is_flat() {
        let mut config = DistributionConfig::new("score");
        config.density_overlay = false;
        let spec = histogram_spec(&config, &plan());
        let root = spec.as_value();
        assert!(root.get("layer").is_none());
        assert_eq!(root["encoding"]["x"]["bin"]["maxbins"], 10);
    }

    #[test]
    fn test_percent_norm_uses_transforms() {
        let mut config = DistributionConfig::new("score");
        config.norm = HistogramNorm::Percent;
        config.density_overlay = false;
        let spec = histogram_spec(&config, &plan());
        let transforms = spec.as_value()["transform"].as_array().unwrap();
        assert_eq!(transforms.len(), 4);
        assert_eq!(spec.as_value()["encoding"]["y"]["field"], "percent");
    }
}
