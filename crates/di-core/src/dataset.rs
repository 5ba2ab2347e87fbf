//! In-memory dataset model
//!
//! A [`Dataset`] wraps an arrow [`RecordBatch`]: an ordered sequence of named,
//! nullable columns sharing one row count. It is created by the ingestion
//! crate, owned by the session, and read by every transformation.

use std::fmt;
use std::sync::Arc;

use ahash::AHashSet;
use arrow::array::{Array, ArrayRef, BooleanArray, Date32Array, Date64Array, TimestampMicrosecondArray, TimestampMillisecondArray, TimestampNanosecondArray, TimestampSecondArray};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use chrono::DateTime;

use crate::column::ColumnKind;

/// A single non-null cell value, carried between transformations and chart
/// specs without going through strings. Times are epoch milliseconds (UTC).
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Bool(bool),
    Time(i64),
}

impl CellValue {
    pub fn kind(&self) -> ColumnKind {
        match self {
            CellValue::Number(_) => ColumnKind::Numeric,
            CellValue::Text(_) => ColumnKind::Categorical,
            CellValue::Bool(_) => ColumnKind::Boolean,
            CellValue::Time(_) => ColumnKind::Datetime,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(v) => write!(f, "{v}"),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Time(ms) => match DateTime::from_timestamp_millis(*ms) {
                Some(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
                None => write!(f, "{ms}"),
            },
        }
    }
}

/// The current in-memory table for a session.
#[derive(Debug, Clone)]
pub struct Dataset {
    name: String,
    batch: RecordBatch,
}

impl Dataset {
    pub fn new(name: impl Into<String>, batch: RecordBatch) -> Self {
        Self { name: name.into(), batch }
    }

    /// Build a dataset from named arrays. All arrays must share one length.
    pub fn from_columns(
        name: impl Into<String>,
        columns: Vec<(&str, ArrayRef)>,
    ) -> Result<Self, ArrowError> {
        let fields: Vec<Field> = columns
            .iter()
            .map(|(col_name, array)| Field::new(*col_name, array.data_type().clone(), true))
            .collect();
        let arrays: Vec<ArrayRef> = columns.into_iter().map(|(_, array)| array).collect();
        let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?;
        Ok(Self::new(name, batch))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn schema(&self) -> SchemaRef {
        self.batch.schema()
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn num_columns(&self) -> usize {
        self.batch.num_columns()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|field| field.name().clone())
            .collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.batch.schema().index_of(name).ok()
    }

    pub fn column(&self, name: &str) -> Option<ArrayRef> {
        self.column_index(name).map(|idx| self.batch.column(idx).clone())
    }

    /// Raw kind of a column, before any cardinality-based reclassification.
    pub fn raw_kind(&self, name: &str) -> Option<ColumnKind> {
        self.column_index(name)
            .map(|idx| ColumnKind::from_data_type(self.batch.schema().field(idx).data_type()))
    }

    pub fn null_count(&self, name: &str) -> Option<usize> {
        self.column(name).map(|array| array.null_count())
    }

    /// Number of distinct non-null values in a column.
    pub fn distinct_count(&self, name: &str) -> Option<usize> {
        let array = self.column(name)?;
        let mut seen: AHashSet<String> = AHashSet::new();
        for row in 0..array.len() {
            if !array.is_null(row) {
                if let Ok(text) = arrow::util::display::array_value_to_string(&array, row) {
                    seen.insert(text);
                }
            }
        }
        Some(seen.len())
    }

    /// Extract a numeric column as nullable f64 values. Returns `None` when
    /// the column is missing or not numeric.
    pub fn numeric_values(&self, name: &str) -> Option<Vec<Option<f64>>> {
        let array = self.column(name)?;
        if ColumnKind::from_data_type(array.data_type()) != ColumnKind::Numeric {
            return None;
        }
        Some((0..array.len()).map(|row| numeric_at(&array, row)).collect())
    }

    /// Extract a datetime column as nullable epoch milliseconds.
    pub fn timestamp_values_ms(&self, name: &str) -> Option<Vec<Option<i64>>> {
        let array = self.column(name)?;
        if ColumnKind::from_data_type(array.data_type()) != ColumnKind::Datetime {
            return None;
        }
        Some((0..array.len()).map(|row| timestamp_ms_at(&array, row)).collect())
    }

    /// Render one cell for display. `None` when the cell is null.
    pub fn display_value(&self, name: &str, row: usize) -> Option<String> {
        let array = self.column(name)?;
        if row >= array.len() || array.is_null(row) {
            return None;
        }
        arrow::util::display::array_value_to_string(&array, row).ok()
    }

    /// Typed view of one cell. `None` when the cell is null.
    pub fn cell_value(&self, name: &str, row: usize) -> Option<CellValue> {
        let array = self.column(name)?;
        if row >= array.len() || array.is_null(row) {
            return None;
        }
        match ColumnKind::from_data_type(array.data_type()) {
            ColumnKind::Numeric => numeric_at(&array, row).map(CellValue::Number),
            ColumnKind::Boolean => array
                .as_any()
                .downcast_ref::<BooleanArray>()
                .map(|bools| CellValue::Bool(bools.value(row))),
            ColumnKind::Datetime => timestamp_ms_at(&array, row).map(CellValue::Time),
            ColumnKind::Categorical | ColumnKind::Other => arrow::util::display::array_value_to_string(&array, row)
                .ok()
                .map(CellValue::Text),
        }
    }

    /// Approximate heap footprint of all column buffers.
    pub fn memory_bytes(&self) -> usize {
        self.batch
            .columns()
            .iter()
            .map(|array| array.get_array_memory_size())
            .sum()
    }

    /// First `n` rows, sharing the underlying buffers.
    pub fn head(&self, n: usize) -> Dataset {
        let take = n.min(self.num_rows());
        Dataset::new(self.name.clone(), self.batch.slice(0, take))
    }
}

fn numeric_at(array: &ArrayRef, row: usize) -> Option<f64> {
    use arrow::array::{
        Float32Array, Float64Array, Int16Array, Int32Array, Int64Array, Int8Array, UInt16Array,
        UInt32Array, UInt64Array, UInt8Array,
    };
    if array.is_null(row) {
        return None;
    }
    macro_rules! value_as_f64 {
        ($ty:ty) => {
            array.as_any().downcast_ref::<$ty>().map(|a| a.value(row) as f64)
        };
    }
    match array.data_type() {
        DataType::Int8 => value_as_f64!(Int8Array),
        DataType::Int16 => value_as_f64!(Int16Array),
        DataType::Int32 => value_as_f64!(Int32Array),
        DataType::Int64 => value_as_f64!(Int64Array),
        DataType::UInt8 => value_as_f64!(UInt8Array),
        DataType::UInt16 => value_as_f64!(UInt16Array),
        DataType::UInt32 => value_as_f64!(UInt32Array),
        DataType::UInt64 => value_as_f64!(UInt64Array),
        DataType::Float32 => value_as_f64!(Float32Array),
        DataType::Float64 => value_as_f64!(Float64Array),
        _ => None,
    }
}

fn timestamp_ms_at(array: &ArrayRef, row: usize) -> Option<i64> {
    if array.is_null(row) {
        return None;
    }
    match array.data_type() {
        DataType::Timestamp(TimeUnit::Second, _) => array
            .as_any()
            .downcast_ref::<TimestampSecondArray>()
            .map(|a| a.value(row) * 1000),
        DataType::Timestamp(TimeUnit::Millisecond, _) => array
            .as_any()
            .downcast_ref::<TimestampMillisecondArray>()
            .map(|a| a.value(row)),
        DataType::Timestamp(TimeUnit::Microsecond, _) => array
            .as_any()
            .downcast_ref::<TimestampMicrosecondArray>()
            .map(|a| a.value(row) / 1000),
        DataType::Timestamp(TimeUnit::Nanosecond, _) => array
            .as_any()
            .downcast_ref::<TimestampNanosecondArray>()
            .map(|a| a.value(row) / 1_000_000),
        DataType::Date32 => array
            .as_any()
            .downcast_ref::<Date32Array>()
            .map(|a| a.value(row) as i64 * 86_400_000),
        DataType::Date64 => array.as_any().downcast_ref::<Date64Array>().map(|a| a.value(row)),
        _ => None,
    }
}
