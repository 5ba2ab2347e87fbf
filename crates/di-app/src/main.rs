//! Command-line entry point
//!
//! Drives the full pipeline against one uploaded file: ingest, profile,
//! print the analysis report, and emit chart specifications for a default
//! bar chart when the dataset offers suitable columns.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use di_charts::{bar_chart_spec, ChartSpec};
use di_core::config::{Aggregate, AggregateKind, BarChartConfig, ChartConfig};
use di_core::SessionContext;
use di_data::ingest_bytes;
use di_report::{assemble_report, grouped_to_csv, FormatOptions, ReportSections, Table};
use di_transform::aggregate::{aggregate, AggregationRequest};
use di_transform::classify::{selectable_categorical, selectable_numeric};
use di_transform::DEFAULT_LOW_CARDINALITY;

#[derive(Parser, Debug)]
#[command(name = "datainsight", about = "Profile a dataset and emit chart specs")]
struct Args {
    /// CSV, TSV or spreadsheet file to analyze
    file: PathBuf,

    /// Low-cardinality threshold for treating columns as categorical
    #[arg(long, default_value_t = DEFAULT_LOW_CARDINALITY)]
    threshold: usize,

    /// Directory to write the default chart's spec JSON and data CSV into
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Skip the printed analysis report
    #[arg(long)]
    no_report: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let file_name = args
        .file
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("upload")
        .to_string();
    let bytes = fs::read(&args.file)
        .with_context(|| format!("reading {}", args.file.display()))?;

    let mut session = SessionContext::new();
    let dataset = ingest_bytes(&file_name, &bytes).context("ingesting dataset")?;
    session.replace_dataset(dataset);
    let dataset = session
        .dataset()
        .context("no dataset in session after upload")?;

    if !args.no_report {
        let report = assemble_report(dataset, &ReportSections::default(), &FormatOptions::default());
        for section in &report.sections {
            println!("## {}", section.title);
            print_table(&section.table);
            println!();
        }
    }

    // Default bar chart: first categorical column, summing the first
    // numeric column when one exists, counting rows otherwise.
    let categorical = selectable_categorical(dataset, args.threshold);
    let numeric = selectable_numeric(dataset);
    let Some(x_col) = categorical.first() else {
        warn!("no categorical columns; skipping default chart");
        return Ok(());
    };
    let aggregate_fn = match numeric.first() {
        Some(value) => Aggregate::new(AggregateKind::Sum, Some(value.clone()))?,
        None => Aggregate::Count,
    };

    let config = BarChartConfig::new(x_col.clone(), aggregate_fn);
    let request = AggregationRequest {
        group_by: config.x_col.clone(),
        aggregate: config.aggregate.clone(),
        remove_nulls: config.remove_nulls,
        sort_by: config.sort_by,
        direction: config.direction,
        top_n: config.top_n,
    };
    let grouped = aggregate(dataset, &request)?;
    if grouped.is_empty() {
        warn!("default chart has no rows to plot");
        return Ok(());
    }
    let spec = bar_chart_spec(&config, &grouped);
    session.add_chart(ChartConfig::Bar(config))?;

    match &args.out_dir {
        Some(out_dir) => {
            fs::create_dir_all(out_dir)
                .with_context(|| format!("creating {}", out_dir.display()))?;
            write_chart_outputs(out_dir, &spec, &grouped)?;
        }
        None => {
            println!("## Default chart spec");
            println!("{}", spec.to_json()?);
        }
    }

    info!(charts = session.charts().len(), "session complete");
    Ok(())
}

fn write_chart_outputs(
    out_dir: &PathBuf,
    spec: &ChartSpec,
    grouped: &di_transform::GroupedResult,
) -> Result<()> {
    let spec_path = out_dir.join("bar_chart_1.json");
    fs::write(&spec_path, spec.to_json()?)
        .with_context(|| format!("writing {}", spec_path.display()))?;

    let csv_path = out_dir.join("bar_chart_1.csv");
    fs::write(&csv_path, grouped_to_csv(grouped)?)
        .with_context(|| format!("writing {}", csv_path.display()))?;

    info!(spec = %spec_path.display(), data = %csv_path.display(), "wrote chart outputs");
    Ok(())
}

/// Plain aligned-column table printer for terminal output.
fn print_table(table: &Table) {
    let mut widths: Vec<usize> = table.columns.iter().map(|name| name.chars().count()).collect();
    for row in &table.rows {
        for (idx, cell) in row.iter().enumerate() {
            if idx < widths.len() {
                widths[idx] = widths[idx].max(cell.chars().count());
            }
        }
    }

    let header: Vec<String> = table
        .columns
        .iter()
        .zip(widths.iter().copied())
        .map(|(name, width)| format!("{name:<width$}"))
        .collect();
    println!("{}", header.join("  "));
    for row in &table.rows {
        let cells: Vec<String> = row
            .iter()
            .zip(widths.iter().copied())
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect();
        println!("{}", cells.join("  "));
    }
}
