//! The chart-specification value and shared encoding helpers

use chrono::DateTime;
use serde_json::{Map, Value};

use di_core::{CellValue, ColumnKind};
use di_transform::AxisValue;

use crate::ChartError;

/// Schema the generated specifications target.
pub const VEGA_LITE_SCHEMA: &str = "https://vega.github.io/schema/vega-lite/v5.json";

/// A complete, self-contained chart specification. Data is inlined, so the
/// rendering collaborator needs nothing beyond this value.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    root: Value,
}

impl ChartSpec {
    pub(crate) fn from_value(root: Value) -> Self {
        Self { root }
    }

    pub fn as_value(&self) -> &Value {
        &self.root
    }

    pub fn to_json(&self) -> Result<String, ChartError> {
        serde_json::to_string_pretty(&self.root).map_err(ChartError::from)
    }

    /// Override the auto-sized dimensions.
    pub fn set_size(&mut self, width: Option<u32>, height: Option<u32>) {
        if let Some(object) = self.root.as_object_mut() {
            if let Some(width) = width {
                object.insert("width".to_string(), Value::from(width));
            }
            if let Some(height) = height {
                object.insert("height".to_string(), Value::from(height));
            }
        }
    }

    /// Set or clear the canvas background. `None` leaves the canvas
    /// transparent.
    pub fn set_background(&mut self, color: Option<&str>) {
        if let Some(object) = self.root.as_object_mut() {
            match color {
                Some(color) => {
                    object.insert("background".to_string(), Value::from(color));
                }
                None => {
                    object.remove("background");
                }
            }
        }
    }
}

/// Vega-Lite field type for a column bucket.
pub fn encoding_type(kind: ColumnKind) -> &'static str {
    match kind {
        ColumnKind::Numeric => "quantitative",
        ColumnKind::Datetime => "temporal",
        ColumnKind::Categorical | ColumnKind::Boolean | ColumnKind::Other => "nominal",
    }
}

pub(crate) fn time_iso(ms: i64) -> String {
    match DateTime::from_timestamp_millis(ms) {
        Some(dt) => dt.format("%Y-%m-%dT%H:%M:%S%.3f").to_string(),
        None => ms.to_string(),
    }
}

pub(crate) fn cell_to_json(value: &Option<CellValue>) -> Value {
    match value {
        None => Value::Null,
        Some(CellValue::Number(v)) if v.is_finite() => Value::from(*v),
        Some(CellValue::Number(_)) => Value::Null,
        Some(CellValue::Text(s)) => Value::from(s.clone()),
        Some(CellValue::Bool(b)) => Value::from(*b),
        Some(CellValue::Time(ms)) => Value::from(time_iso(*ms)),
    }
}

pub(crate) fn axis_to_json(value: &AxisValue) -> Value {
    match value {
        AxisValue::Time(ms) => Value::from(time_iso(*ms)),
        AxisValue::Number(v) if v.is_finite() => Value::from(*v),
        AxisValue::Number(_) => Value::Null,
        AxisValue::Text(s) => Value::from(s.clone()),
    }
}

pub(crate) fn number_or_null(value: f64) -> Value {
    if value.is_finite() {
        Value::from(value)
    } else {
        Value::Null
    }
}

/// y-axis (or value-axis) scale object, honoring a log toggle.
pub(crate) fn scale_object(log: bool) -> Value {
    let mut scale = Map::new();
    if log {
        scale.insert("type".to_string(), Value::from("log"));
    }
    Value::Object(scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_encoding_types() {
        assert_eq!(encoding_type(ColumnKind::Numeric), "quantitative");
        assert_eq!(encoding_type(ColumnKind::Datetime), "temporal");
        assert_eq!(encoding_type(ColumnKind::Categorical), "nominal");
        assert_eq!(encoding_type(ColumnKind::Boolean), "nominal");
    }

    #[test]
    fn test_size_and_background_overrides() {
        let mut spec = ChartSpec::from_value(json!({"mark": "bar"}));
        spec.set_size(Some(800), None);
        spec.set_background(Some("white"));
        assert_eq!(spec.as_value()["width"], 800);
        assert_eq!(spec.as_value()["background"], "white");

        spec.set_background(None);
        assert!(spec.as_value().get("background").is_none());
    }

    #[test]
    fn test_time_iso() {
        assert_eq!(time_iso(0), "1970-01-01T00:00:00.000");
    }
}
