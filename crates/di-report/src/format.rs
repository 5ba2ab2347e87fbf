//! Table formatting rules for report export

/// Marker appended to truncated cells.
pub const ELLIPSIS: char = '…';

/// Formatting rules applied to every rendered table.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatOptions {
    /// Decimal places for numeric cells.
    pub decimals: usize,
    /// Maximum characters per cell before truncation.
    pub max_cell_chars: usize,
    /// Maximum data rows rendered per table.
    pub max_rows: usize,
    /// Maximum columns rendered per table.
    pub max_cols: usize,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self { decimals: 2, max_cell_chars: 60, max_rows: 50, max_cols: 20 }
    }
}

impl FormatOptions {
    /// Render a numeric cell. Non-finite values render empty, the report's
    /// "not applicable" marker.
    pub fn number(&self, value: f64) -> String {
        if value.is_finite() {
            format!("{value:.precision$}", precision = self.decimals)
        } else {
            String::new()
        }
    }

    /// Render an integer cell (never truncated by decimals).
    pub fn integer(&self, value: usize) -> String {
        value.to_string()
    }

    /// Truncate an over-long cell, marking the cut with an ellipsis.
    pub fn cell(&self, text: &str) -> String {
        if text.chars().count() <= self.max_cell_chars {
            return text.to_string();
        }
        let mut truncated: String = text.chars().take(self.max_cell_chars.saturating_sub(1)).collect();
        truncated.push(ELLIPSIS);
        truncated
    }
}

/// A formatted table: column headers plus stringified rows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns, rows: Vec::new() }
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Apply the row/column caps.
    pub fn clip(&mut self, options: &FormatOptions) {
        self.columns.truncate(options.max_cols);
        self.rows.truncate(options.max_rows);
        for row in &mut self.rows {
            row.truncate(options.max_cols);
        }
    }
}
