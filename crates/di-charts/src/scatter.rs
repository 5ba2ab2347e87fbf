//! Scatter plot specification

use serde_json::{json, Map, Value};

use di_core::config::{PointColor, PointSize, ScatterChartConfig, Trendline};
use di_core::ColumnKind;
use di_transform::ScatterFrame;

use crate::spec::{cell_to_json, encoding_type, scale_object, ChartSpec, VEGA_LITE_SCHEMA};

const TRENDLINE_COLOR: &str = "#333333";

/// Build the declarative spec for a scatter plot over a prepared frame.
pub fn scatter_chart_spec(config: &ScatterChartConfig, frame: &ScatterFrame) -> ChartSpec {
    let values: Vec<Value> = (0..frame.num_rows())
        .map(|row| {
            let mut row_obj = Map::new();
            for column in &frame.columns {
                row_obj.insert(column.name.clone(), cell_to_json(&column.values[row]));
            }
            Value::Object(row_obj)
        })
        .collect();

    let x_type = if config.treat_x_as_time {
        "temporal"
    } else {
        frame
            .column(&config.x_col)
            .and_then(|column| column.values.iter().flatten().next())
            .map(|cell| encoding_type(cell.kind()))
            .unwrap_or(encoding_type(ColumnKind::Numeric))
    };

    let mut x_enc = json!({ "field": config.x_col, "type": x_type, "title": config.x_col });
    if config.x_log && !config.treat_x_as_time {
        x_enc["scale"] = scale_object(true);
    }
    let y_enc = json!({
        "field": config.y_col,
        "type": "quantitative",
        "title": config.y_col,
        "scale": scale_object(config.y_log),
    });

    let color_enc = match &config.color {
        PointColor::Fixed { color } => json!({ "value": color }),
        PointColor::ByCategory { column, palette, reverse } => json!({
            "field": column,
            "type": "nominal",
            "title": column,
            "scale": { "scheme": palette.scheme_name(), "reverse": reverse },
            "legend": if config.show_legend { json!({}) } else { Value::Null },
        }),
        PointColor::ByValue { column, palette, reverse } => json!({
            "field": column,
            "type": "quantitative",
            "title": column,
            "scale": { "scheme": palette.scheme_name(), "reverse": reverse },
            "legend": if config.show_legend { json!({}) } else { Value::Null },
        }),
    };
    let size_enc = match &config.size {
        PointSize::Fixed { area } => json!({ "value": area }),
        PointSize::ByColumn { column, range } => json!({
            "field": column,
            "type": "quantitative",
            "title": column,
            "scale": { "range": [range.0, range.1] },
        }),
    };

    let points = json!({
        "mark": { "type": "circle", "opacity": config.opacity },
        "encoding": {
            "x": x_enc.clone(),
            "y": y_enc.clone(),
            "color": color_enc.clone(),
            "size": size_enc,
            "tooltip": [
                { "field": config.x_col, "type": x_type, "title": config.x_col },
                { "field": config.y_col, "type": "quantitative", "title": config.y_col },
            ],
        },
    });

    let mut layers = vec![points];
    if let Some(trend) = trendline_layer(config, &x_enc, &y_enc, &color_enc) {
        layers.push(trend);
    }

    let title = config.title.clone().unwrap_or_else(|| "Scatter Plot".to_string());
    let inner = if layers.len() > 1 {
        json!({ "height": 420, "layer": layers })
    } else {
        let mut only = layers.remove(0);
        if let Some(object) = only.as_object_mut() {
            object.insert("height".to_string(), Value::from(420));
        }
        only
    };

    // Faceting wraps the (possibly layered) spec in small multiples.
    let root = match &config.facet_col {
        Some(facet) => json!({
            "$schema": VEGA_LITE_SCHEMA,
            "title": title,
            "data": { "values": values },
            "facet": { "column": { "field": facet, "type": "nominal", "title": facet } },
            "spec": inner,
        }),
        None => {
            let mut root = json!({
                "$schema": VEGA_LITE_SCHEMA,
                "title": title,
                "data": { "values": values },
            });
            if let (Some(object), Some(inner)) = (root.as_object_mut(), inner.as_object()) {
                for (key, value) in inner {
                    object.insert(key.clone(), value.clone());
                }
            }
            root
        }
    };

    ChartSpec::from_value(root)
}

/// Declarative regression/LOESS overlay. Per-group trendlines reuse the
/// categorical color encoding; otherwise the line is a fixed neutral color.
fn trendline_layer(
    config: &ScatterChartConfig,
    x_enc: &Value,
    y_enc: &Value,
    color_enc: &Value,
) -> Option<Value> {
    let group_column = match &config.color {
        PointColor::ByCategory { column, .. } => Some(column.clone()),
        _ => None,
    };
    let (transform, per_group) = match &config.trendline {
        Trendline::None => return None,
        Trendline::Linear { per_group } => {
            let mut t = json!({ "regression": config.y_col, "on": config.x_col });
            if *per_group {
                if let Some(group) = &group_column {
                    t["groupby"] = json!([group]);
                }
            }
            (t, *per_group)
        }
        Trendline::Loess { per_group, bandwidth } => {
            let mut t = json!({ "loess": config.y_col, "on": config.x_col, "bandwidth": bandwidth });
            if *per_group {
                if let Some(group) = &group_column {
                    t["groupby"] = json!([group]);
                }
            }
            (t, *per_group)
        }
    };

    let color = if per_group && group_column.is_some() {
        color_enc.clone()
    } else {
        json!({ "value": TRENDLINE_COLOR })
    };
    Some(json!({
        "transform": [transform],
        "mark": { "type": "line", "strokeWidth": 2 },
        "encoding": { "x": x_enc, "y": y_enc, "color": color },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use di_core::config::DiscretePalette;
    use di_core::CellValue;
    use di_transform::scatter::ScatterColumn;

    fn frame() -> ScatterFrame {
        ScatterFrame {
            columns: vec![
                ScatterColumn {
                    name: "x".into(),
                    values: vec![Some(CellValue::Number(1.0)), Some(CellValue::Number(2.0))],
                },
                ScatterColumn {
                    name: "y".into(),
                    values: vec![Some(CellValue::Number(3.0)), Some(CellValue::Number(4.0))],
                },
                ScatterColumn {
                    name: "cat".into(),
                    values: vec![Some(CellValue::Text("a".into())), Some(CellValue::Text("b".into()))],
                },
            ],
        }
    }

    #[test]
    fn test_fixed_color_and_size_are_values() {
        let config = ScatterChartConfig::new("x", "y");
        let spec = scatter_chart_spec(&config, &frame());
        let encoding = &spec.as_value()["encoding"];
        assert_eq!(encoding["color"]["value"], "#4C78A8");
        assert_eq!(encoding["size"]["value"], 60.0);
        assert_eq!(encoding["x"]["type"], "quantitative");
    }

    #[test]
    fn test_categorical_color_encoding() {
        let mut config = ScatterChartConfig::new("x", "y");
        config.color = PointColor::ByCategory {
            column: "cat".into(),
            palette: DiscretePalette::Set2,
            reverse: true,
        };
        let spec = scatter_chart_spec(&config, &frame());
        let color = &spec.as_value()["encoding"]["color"];
        assert_eq!(color["field"], "cat");
        assert_eq!(color["scale"]["scheme"], "set2");
        assert_eq!(color["scale"]["reverse"], true);
    }

    #[test]
    fn test_trendline_adds_layer() {
        let mut config = ScatterChartConfig::new("x", "y");
        config.trendline = Trendline::Linear { per_group: false };
        let spec = scatter_chart_spec(&config, &frame());
        let layers = spec.as_value()["layer"].as_array().unwrap();
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[1]["transform"][0]["regression"], "y");
        assert_eq!(layers[1]["encoding"]["color"]["value"], TRENDLINE_COLOR);
    }

    #[test]
    fn test_loess_per_group_uses_color_encoding() {
        let mut config = ScatterChartConfig::new("x", "y");
        config.color = PointColor::ByCategory {
            column: "cat".into(),
            palette: DiscretePalette::Tableau10,
            reverse: false,
        };
        config.trendline = Trendline::Loess { per_group: true, bandwidth: 0.3 };
        let spec = scatter_chart_spec(&config, &frame());
        let trend = &spec.as_value()["layer"][1];
        assert_eq!(trend["transform"][0]["bandwidth"], 0.3);
        assert_eq!(trend["transform"][0]["groupby"][0], "cat");
        assert_eq!(trend["encoding"]["color"]["field"], "cat");
    }

    #[test]
    fn test_facet_wraps_spec() {
        let mut config = ScatterChartConfig::new("x", "y");
        config.facet_col = Some("cat".into());
        let spec = scatter_chart_spec(&config, &frame());
        let root = spec.as_value();
        assert_eq!(root["facet"]["column"]["field"], "cat");
        assert!(root["spec"]["mark"].is_object());
    }
}
