//! Report assembly
//!
//! Builds the ordered sequence of titled tables behind the analysis
//! report. Sections are independently toggle-able but always appear in one
//! canonical order; a section with nothing to show is omitted rather than
//! rendered empty.

use tracing::info;

use di_core::Dataset;
use di_transform::classify::classify_columns;
use di_transform::profile::{duplicate_row_indices, profile_dataset};
use di_transform::DEFAULT_LOW_CARDINALITY;

use crate::format::{FormatOptions, Table};

const PREVIEW_ROWS: usize = 10;
const DUPLICATE_SAMPLE_ROWS: usize = 10;

/// Which report sections to render.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSections {
    pub quick_stats: bool,
    pub columns_by_type: bool,
    pub missing_values: bool,
    pub preview: bool,
    pub numeric_description: bool,
    pub categorical_description: bool,
    pub unique_values: bool,
    pub correlations: bool,
    pub duplicates_sample: bool,
}

impl Default for ReportSections {
    fn default() -> Self {
        Self {
            quick_stats: true,
            columns_by_type: true,
            missing_values: true,
            preview: true,
            numeric_description: true,
            categorical_description: true,
            unique_values: true,
            correlations: true,
            duplicates_sample: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportSection {
    pub title: String,
    pub table: Table,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Report {
    pub sections: Vec<ReportSection>,
}

impl Report {
    pub fn titles(&self) -> Vec<&str> {
        self.sections.iter().map(|section| section.title.as_str()).collect()
    }
}

/// Assemble the enabled sections in canonical order.
pub fn assemble_report(dataset: &Dataset, sections: &ReportSections, options: &FormatOptions) -> Report {
    let profile = profile_dataset(dataset);
    let mut report = Report::default();

    let mut push = |report: &mut Report, title: &str, mut table: Table| {
        table.clip(options);
        if !table.is_empty() {
            report.sections.push(ReportSection { title: title.to_string(), table });
        }
    };

    if sections.quick_stats {
        let mut table = Table::new(vec!["metric".into(), "value".into()]);
        table.push_row(vec!["Rows".into(), options.integer(profile.rows)]);
        table.push_row(vec!["Columns".into(), options.integer(profile.columns)]);
        table.push_row(vec!["Memory".into(), format_bytes(profile.memory_bytes)]);
        table.push_row(vec!["Duplicate rows".into(), options.integer(profile.duplicate_rows)]);
        push(&mut report, "Quick stats", table);
    }

    if sections.columns_by_type {
        let mut table = Table::new(vec!["type".into(), "count".into(), "columns".into()]);
        for (kind, columns) in classify_columns(dataset, DEFAULT_LOW_CARDINALITY) {
            if columns.is_empty() {
                continue;
            }
            table.push_row(vec![
                kind.to_string(),
                options.integer(columns.len()),
                options.cell(&columns.join(", ")),
            ]);
        }
        push(&mut report, "Columns by type", table);
    }

    if sections.missing_values {
        let mut table = Table::new(vec!["column".into(), "nulls".into(), "percent".into()]);
        for missing in &profile.missing {
            table.push_row(vec![
                options.cell(&missing.name),
                options.integer(missing.null_count),
                options.number(missing.null_pct),
            ]);
        }
        push(&mut report, "Missing values", table);
    }

    if sections.preview {
        push(
            &mut report,
            "Preview",
            rows_table(dataset, &preview_rows(dataset, options), options),
        );
    }

    if sections.numeric_description {
        let mut table = Table::new(
            ["column", "count", "mean", "std", "min", "25%", "50%", "75%", "max"]
                .map(String::from)
                .to_vec(),
        );
        for summary in &profile.numeric {
            table.push_row(vec![
                options.cell(&summary.name),
                options.integer(summary.count),
                options.number(summary.mean),
                options.number(summary.std),
                options.number(summary.min),
                options.number(summary.q25),
                options.number(summary.q50),
                options.number(summary.q75),
                options.number(summary.max),
            ]);
        }
        push(&mut report, "Numeric description", table);
    }

    if sections.categorical_description {
        let mut table =
            Table::new(["column", "count", "unique", "top", "freq"].map(String::from).to_vec());
        for summary in &profile.categorical {
            table.push_row(vec![
                options.cell(&summary.name),
                options.integer(summary.count),
                options.integer(summary.unique),
                summary.top.as_deref().map(|top| options.cell(top)).unwrap_or_default(),
                options.integer(summary.freq),
            ]);
        }
        push(&mut report, "Categorical description", table);
    }

    if sections.unique_values {
        let mut table = Table::new(vec!["column".into(), "unique".into()]);
        for (name, unique) in &profile.unique_counts {
            table.push_row(vec![options.cell(name), options.integer(*unique)]);
        }
        push(&mut report, "Unique values", table);
    }

    if sections.correlations {
        if let Some(matrix) = &profile.correlation {
            let mut columns = vec![String::new()];
            columns.extend(matrix.columns.iter().map(|name| options.cell(name)));
            let mut table = Table::new(columns);
            for (name, row) in matrix.columns.iter().zip(&matrix.values) {
                let mut cells = vec![options.cell(name)];
                cells.extend(
                    row.iter().map(|value| value.map(|v| options.number(v)).unwrap_or_default()),
                );
                table.push_row(cells);
            }
            push(&mut report, "Correlations", table);
        }
    }

    if sections.duplicates_sample {
        let duplicates: Vec<usize> =
            duplicate_row_indices(dataset).into_iter().take(DUPLICATE_SAMPLE_ROWS).collect();
        push(&mut report, "Duplicates sample", rows_table(dataset, &duplicates, options));
    }

    info!(sections = report.sections.len(), "assembled report");
    report
}

fn preview_rows(dataset: &Dataset, options: &FormatOptions) -> Vec<usize> {
    (0..dataset.num_rows().min(PREVIEW_ROWS).min(options.max_rows)).collect()
}

/// Render specific dataset rows as a table, nulls as empty cells.
fn rows_table(dataset: &Dataset, rows: &[usize], options: &FormatOptions) -> Table {
    let names = dataset.column_names();
    let mut table = Table::new(names.iter().map(|name| options.cell(name)).collect());
    for &row in rows {
        table.push_row(
            names
                .iter()
                .map(|name| {
                    dataset
                        .display_value(name, row)
                        .map(|text| options.cell(&text))
                        .unwrap_or_default()
                })
                .collect(),
        );
    }
    table
}

/// Human-readable byte count.
fn format_bytes(bytes: usize) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
