//! Report and table export boundaries

use di_transform::GroupedResult;

use crate::assemble::Report;
use crate::format::Table;
use crate::ReportError;

/// Paginating collaborator that turns an assembled report into a document
/// (PDF or similar). Layout, fonts and pagination are its concern, not the
/// core's.
pub trait ReportRenderer {
    fn render_document(&self, report: &Report) -> Result<Vec<u8>, ReportError>;
}

/// Serialize a formatted table to CSV.
pub fn table_to_csv(table: &Table) -> Result<String, ReportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(&table.columns)
        .map_err(|e| ReportError::Csv(e.to_string()))?;
    for row in &table.rows {
        writer.write_record(row).map_err(|e| ReportError::Csv(e.to_string()))?;
    }
    let bytes = writer.into_inner().map_err(|e| ReportError::Csv(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ReportError::Csv(e.to_string()))
}

/// Serialize a grouped result to CSV at full precision, matching the data
/// behind the chart rather than the report's display rounding.
pub fn grouped_to_csv(grouped: &GroupedResult) -> Result<String, ReportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record([grouped.group_column.as_str(), "value"])
        .map_err(|e| ReportError::Csv(e.to_string()))?;
    for row in &grouped.rows {
        let value = if row.value.is_finite() {
            row.value.to_string()
        } else {
            String::new()
        };
        writer
            .write_record([row.key.display(), value.as_str()])
            .map_err(|e| ReportError::Csv(e.to_string()))?;
    }
    let bytes = writer.into_inner().map_err(|e| ReportError::Csv(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ReportError::Csv(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use di_transform::aggregate::{GroupKey, GroupedRow};

    #[test]
    fn test_table_to_csv() {
        let mut table = Table::new(vec!["a".into(), "b".into()]);
        table.push_row(vec!["1".into(), "x, y".into()]);
        let csv = table_to_csv(&table).unwrap();
        assert_eq!(csv, "a,b\n1,\"x, y\"\n");
    }

    #[test]
    fn test_grouped_to_csv() {
        let grouped = GroupedResult {
            group_column: "region".into(),
            value_label: "sum(sales)".into(),
            rows: vec![
                GroupedRow { key: GroupKey::text("North"), value: 40.0 },
                GroupedRow { key: GroupKey::null(), value: f64::NAN },
            ],
        };
        let csv = grouped_to_csv(&grouped).unwrap();
        assert_eq!(csv, "region,value\nNorth,40\nnull,\n");
    }

    #[test]
    fn test_csv_round_trip_preserves_two_decimal_rule() {
        use crate::format::FormatOptions;
        let options = FormatOptions::default();
        let mut table = Table::new(vec!["v".into()]);
        for value in [1.234, 5.678, 9.995] {
            table.push_row(vec![options.number(value)]);
        }
        let csv = table_to_csv(&table).unwrap();

        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        let reread: Vec<f64> = reader
            .records()
            .map(|record| record.unwrap()[0].parse().unwrap())
            .collect();
        for (original, reread) in [1.234, 5.678, 9.995].iter().zip(reread) {
            assert_eq!(options.number(*original), options.number(reread));
        }
    }
}
