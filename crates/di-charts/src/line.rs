//! Line chart specification

use serde_json::{json, Map, Value};

use di_core::config::{LineChartConfig, Orientation};
use di_core::ColumnKind;
use di_transform::SeriesFrame;

use crate::spec::{axis_to_json, encoding_type, number_or_null, scale_object, ChartSpec, VEGA_LITE_SCHEMA};

/// Build the declarative spec for a (possibly grouped, multi-series) line
/// chart over a resampled series frame.
pub fn line_chart_spec(config: &LineChartConfig, frame: &SeriesFrame) -> ChartSpec {
    let values: Vec<Value> = frame
        .points
        .iter()
        .map(|point| {
            let mut row = Map::new();
            row.insert(frame.x_column.clone(), axis_to_json(&point.x));
            row.insert("series_label".to_string(), Value::from(point.series_label()));
            row.insert(
                "value".to_string(),
                point.value.map(number_or_null).unwrap_or(Value::Null),
            );
            Value::Object(row)
        })
        .collect();

    let x_type = if frame.temporal {
        "temporal"
    } else {
        frame
            .points
            .first()
            .map(|point| encoding_type(point.x.kind()))
            .unwrap_or(encoding_type(ColumnKind::Categorical))
    };
    let x_enc = json!({
        "field": frame.x_column,
        "type": x_type,
        "title": frame.x_column,
        "sort": null,
    });

    let y_title = config.y_cols.join(", ");
    let y_enc = json!({
        "field": "value",
        "type": "quantitative",
        "title": y_title,
        "scale": scale_object(config.log_scale),
    });

    let color = json!({
        "field": "series_label",
        "type": "nominal",
        "title": "Series",
        "scale": { "scheme": config.palette.scheme_name(), "reverse": config.reverse_palette },
        "legend": if config.show_legend { json!({}) } else { Value::Null },
    });

    // Horizontal orientation swaps the axes.
    let (x_enc, y_enc) = match config.orientation {
        Orientation::Vertical => (x_enc, y_enc),
        Orientation::Horizontal => (y_enc, x_enc),
    };

    let line_encoding = json!({
        "x": x_enc,
        "y": y_enc,
        "color": color,
        "tooltip": [
            { "field": frame.x_column, "type": x_type, "title": frame.x_column },
            { "field": "value", "type": "quantitative", "title": y_title },
            { "field": "series_label", "type": "nominal", "title": "Series" },
        ],
    });
    let line_mark = if config.show_markers {
        json!({ "type": "line", "point": true })
    } else {
        json!({ "type": "line" })
    };

    let title = config.title.clone().unwrap_or_else(|| "Line Chart".to_string());
    let root = if config.area_fill {
        json!({
            "$schema": VEGA_LITE_SCHEMA,
            "title": title,
            "height": 420,
            "data": { "values": values },
            "layer": [
                { "mark": { "type": "area", "opacity": 0.2 }, "encoding": line_encoding.clone() },
                { "mark": line_mark, "encoding": line_encoding },
            ],
        })
    } else {
        json!({
            "$schema": VEGA_LITE_SCHEMA,
            "title": title,
            "height": 420,
            "data": { "values": values },
            "mark": line_mark,
            "encoding": line_encoding,
        })
    };
    ChartSpec::from_value(root)
}
