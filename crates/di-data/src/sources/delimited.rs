//! Delimited-text source with delimiter sniffing
//!
//! Parsing starts with a comma. When that fails, or collapses the header to
//! a single column, the leading bytes are sniffed for the delimiter among
//! comma, semicolon, pipe and tab, and parsing is retried.

use csv::ReaderBuilder;
use tracing::debug;

use di_core::Dataset;

use super::build_batch;
use crate::DataError;

/// Leading bytes inspected by the sniffer.
const SNIFF_SAMPLE_BYTES: usize = 8192;

const DELIMITER_CANDIDATES: [u8; 4] = [b',', b';', b'|', b'\t'];

pub fn read_delimited(name: &str, bytes: &[u8]) -> Result<Dataset, DataError> {
    let mut parsed = parse_records(bytes, b',');

    let needs_sniff = match &parsed {
        Ok((headers, _)) => headers.len() <= 1,
        Err(_) => true,
    };
    if needs_sniff {
        let sample = &bytes[..bytes.len().min(SNIFF_SAMPLE_BYTES)];
        if let Some(delimiter) = sniff_delimiter(sample) {
            if delimiter != b',' {
                debug!(name, delimiter = %(delimiter as char), "retrying with sniffed delimiter");
                parsed = parse_records(bytes, delimiter);
            }
        }
    }

    let (headers, rows) = parsed?;
    if headers.is_empty() {
        return Err(DataError::Empty(name.to_string()));
    }
    let batch = build_batch(&headers, &rows)?;
    Ok(Dataset::new(name, batch))
}

fn parse_records(bytes: &[u8], delimiter: u8) -> Result<(Vec<String>, Vec<Vec<String>>), DataError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();
    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(record.iter().map(|s| s.to_string()).collect::<Vec<_>>());
    }
    Ok((headers, rows))
}

/// Pick the candidate whose per-line count is consistently the highest.
/// Lines are only compared on their minimum count, so a delimiter that
/// disappears on some line loses to one present on every line.
fn sniff_delimiter(sample: &[u8]) -> Option<u8> {
    let text = String::from_utf8_lossy(sample);
    let mut lines: Vec<&str> = text.lines().filter(|line| !line.trim().is_empty()).collect();
    // The last line may be cut mid-record by the sample window.
    if lines.len() > 1 {
        lines.pop();
    }
    if lines.is_empty() {
        return None;
    }

    let mut best: Option<(u8, usize)> = None;
    for candidate in DELIMITER_CANDIDATES {
        let min_count = lines
            .iter()
            .map(|line| line.bytes().filter(|b| *b == candidate).count())
            .min()
            .unwrap_or(0);
        if min_count > 0 && best.map_or(true, |(_, score)| min_count > score) {
            best = Some((candidate, min_count));
        }
    }
    best.map(|(delimiter, _)| delimiter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use di_core::ColumnKind;

    #[test]
    fn test_reads_comma_csv() {
        let dataset = read_delimited("t.csv", b"region,sales\nNorth,10\nSouth,20\n").unwrap();
        assert_eq!(dataset.num_rows(), 2);
        assert_eq!(dataset.raw_kind("sales"), Some(ColumnKind::Numeric));
        assert_eq!(dataset.raw_kind("region"), Some(ColumnKind::Categorical));
    }

    #[test]
    fn test_sniffs_semicolon() {
        let dataset = read_delimited("t.csv", b"region;sales\nNorth;10\nSouth;20\n").unwrap();
        assert_eq!(dataset.column_names(), vec!["region", "sales"]);
        assert_eq!(dataset.num_rows(), 2);
    }

    #[test]
    fn test_sniffs_tab_and_pipe() {
        let tab = read_delimited("t.tsv", b"a\tb\n1\t2\n").unwrap();
        assert_eq!(tab.column_names(), vec!["a", "b"]);

        let pipe = read_delimited("t.txt", b"a|b\n1|2\n").unwrap();
        assert_eq!(pipe.column_names(), vec!["a", "b"]);
    }

    #[test]
    fn test_empty_cells_become_nulls() {
        let dataset = read_delimited("t.csv", b"a,b\n1,\n,2\n").unwrap();
        assert_eq!(dataset.null_count("a"), Some(1));
        assert_eq!(dataset.null_count("b"), Some(1));
    }

    #[test]
    fn test_unparsable_dates_become_nulls() {
        let bytes = b"day,v\n2024-01-01,1\nbad,2\n2024-01-03,3\n";
        let dataset = read_delimited("t.csv", bytes).unwrap();
        assert_eq!(dataset.raw_kind("day"), Some(ColumnKind::Categorical));

        // A column that is *mostly* dates still types as text; a clean one
        // becomes a timestamp with nulls for blanks only.
        let clean = read_delimited("t.csv", b"day,v\n2024-01-01,1\n,2\n").unwrap();
        assert_eq!(clean.raw_kind("day"), Some(ColumnKind::Datetime));
        assert_eq!(clean.null_count("day"), Some(1));
    }

    #[test]
    fn test_ragged_rows_error() {
        let result = read_delimited("t.csv", b"a,b\n1,2,3\n");
        assert!(matches!(result, Err(DataError::Csv(_))));
    }
}
