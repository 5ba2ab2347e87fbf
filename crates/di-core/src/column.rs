//! Column type buckets

use arrow::datatypes::DataType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse semantic classification of a column.
///
/// The raw kind is derived from the arrow type alone; the classifier in the
/// transform crate may reclassify low-cardinality numeric or datetime
/// columns as categorical on top of this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ColumnKind {
    Numeric,
    Categorical,
    Datetime,
    Boolean,
    Other,
}

impl ColumnKind {
    /// Derive the raw kind from an arrow data type.
    pub fn from_data_type(data_type: &DataType) -> Self {
        match data_type {
            DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float16
            | DataType::Float32
            | DataType::Float64 => ColumnKind::Numeric,
            DataType::Utf8 | DataType::LargeUtf8 => ColumnKind::Categorical,
            DataType::Timestamp(_, _) | DataType::Date32 | DataType::Date64 => ColumnKind::Datetime,
            DataType::Boolean => ColumnKind::Boolean,
            _ => ColumnKind::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnKind::Numeric => "Numeric",
            ColumnKind::Categorical => "Categorical",
            ColumnKind::Datetime => "Datetime",
            ColumnKind::Boolean => "Boolean",
            ColumnKind::Other => "Other",
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_kind_mapping() {
        assert_eq!(ColumnKind::from_data_type(&DataType::Int64), ColumnKind::Numeric);
        assert_eq!(ColumnKind::from_data_type(&DataType::Float64), ColumnKind::Numeric);
        assert_eq!(ColumnKind::from_data_type(&DataType::Utf8), ColumnKind::Categorical);
        assert_eq!(ColumnKind::from_data_type(&DataType::Boolean), ColumnKind::Boolean);
        assert_eq!(
            ColumnKind::from_data_type(&DataType::Timestamp(
                arrow::datatypes::TimeUnit::Millisecond,
                None
            )),
            ColumnKind::Datetime
        );
        assert_eq!(ColumnKind::from_data_type(&DataType::Binary), ColumnKind::Other);
    }
}
