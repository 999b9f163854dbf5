//! CLI entry point for the outlier cleaning engine.

use anyhow::{Result, anyhow};
use clap::{Parser, ValueEnum};
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use statclean::{CleaningMethod, StatClean, SummaryReport};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// CLI-compatible cleaning method enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliMethod {
    /// Interquartile-range fences (default factors 1.5/1.5)
    Iqr,
    /// Z-score against mean and sample standard deviation (default cutoff 3.0)
    Zscore,
    /// Robust modified Z-score based on the median and MAD (default cutoff 3.5)
    ModifiedZscore,
    /// Pick a method per column from its distribution shape
    Auto,
}

impl From<CliMethod> for CleaningMethod {
    fn from(cli: CliMethod) -> Self {
        match cli {
            CliMethod::Iqr => CleaningMethod::Iqr,
            CliMethod::Zscore => CleaningMethod::Zscore,
            CliMethod::ModifiedZscore => CleaningMethod::ModifiedZscore,
            CliMethod::Auto => CleaningMethod::Auto,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Statistical outlier detection and cleaning for tabular data",
    long_about = "Detects and removes statistical outliers from the numeric columns of a\n\
                  CSV file, using IQR fences, Z-scores, or robust modified Z-scores.\n\n\
                  EXAMPLES:\n  \
                  # Clean two columns with automatic method selection\n  \
                  statclean -i data.csv -c price -c quantity -o cleaned.csv\n\n  \
                  # Force the IQR method on every numeric column\n  \
                  statclean -i data.csv --method iqr -o cleaned.csv\n\n  \
                  # Machine-readable summary only\n  \
                  statclean -i data.csv -c price --json"
)]
struct Args {
    /// Path to the CSV file to clean
    #[arg(short, long)]
    input: String,

    /// Column to clean (repeatable)
    ///
    /// If not specified, every numeric column is cleaned
    #[arg(short, long = "column")]
    columns: Vec<String>,

    /// Detection method
    #[arg(short, long, value_enum, default_value = "auto")]
    method: CliMethod,

    /// Path to write the cleaned CSV to
    ///
    /// If not specified, the cleaned data is not written anywhere
    #[arg(short, long)]
    output: Option<String>,

    /// Keep original row positions in the removal records instead of
    /// renumbering rows after each removal
    #[arg(long)]
    preserve_index: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long)]
    quiet: bool,

    /// Output the summary report as JSON to stdout
    ///
    /// Disables all progress logs; only outputs the final JSON report.
    /// Useful for piping to other tools: `... --json | jq .total_rows_removed`
    #[arg(long)]
    json: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    if !Path::new(&args.input).exists() {
        return Err(anyhow!("Input file not found: {}", args.input));
    }

    info!("Loading dataset from: {}", args.input);
    let data = load_csv_with_fallbacks(&args.input)?;
    info!("Dataset loaded successfully: {:?}", data.shape());

    let columns: Vec<String> = if args.columns.is_empty() {
        numeric_column_names(&data)
    } else {
        args.columns.clone()
    };
    if columns.is_empty() {
        return Err(anyhow!("No numeric columns to clean in {}", args.input));
    }

    let mut session = StatClean::new(data, args.preserve_index)?;
    if !args.quiet && !args.json {
        session = session.on_progress(|update| info!("{}", update.message));
    }

    let column_refs: Vec<&str> = columns.iter().map(String::as_str).collect();
    let show_progress = !args.quiet && !args.json;
    let (mut cleaned, _records) =
        session.clean_columns(&column_refs, args.method.into(), show_progress)?;

    if let Some(ref output) = args.output {
        write_csv(&mut cleaned, output)?;
        info!("Cleaned data written to: {}", output);
    }

    let report = session.get_summary_report();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report, &args);
    }

    Ok(())
}

/// Names of the numeric columns of a dataset, in schema order.
fn numeric_column_names(df: &DataFrame) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|col| statclean::stats::is_numeric_dtype(col.dtype()))
        .map(|col| col.name().to_string())
        .collect()
}

fn write_csv(df: &mut DataFrame, path: &str) -> Result<()> {
    if let Some(parent) = Path::new(path).parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::File::create(path)?;
    CsvWriter::new(&mut file).finish(df)?;
    Ok(())
}

/// Print a human-readable summary of the cleaning results.
///
/// Uses `println!` intentionally: this is the primary CLI output and should
/// be visible regardless of log level settings.
fn print_summary(report: &SummaryReport, args: &Args) {
    println!();
    println!("{}", "=".repeat(60));
    println!("CLEANING COMPLETE");
    println!("{}", "=".repeat(60));

    match report {
        SummaryReport::NoOperations { status } => {
            println!("  {}", status);
        }
        SummaryReport::Cleaned {
            original_shape,
            clean_shape,
            total_rows_removed,
            columns,
        } => {
            println!(
                "Input:  {} ({} rows x {} columns)",
                args.input, original_shape.0, original_shape.1
            );
            println!(
                "Rows: {} -> {} ({} removed)",
                original_shape.0, clean_shape.0, total_rows_removed
            );
            println!();
            println!(
                "{:<24} {:<20} {:<12} {:<10}",
                "Column", "Method", "Outliers", "Pct"
            );
            println!("{}", "-".repeat(60));
            for (name, summary) in columns {
                println!(
                    "{:<24} {:<20} {:<12} {:<10.2}",
                    name,
                    summary.method.display_name(),
                    summary.n_outliers,
                    summary.pct_outliers
                );
            }
        }
    }

    println!();
    println!("Use --json for machine-readable output");
    println!("{}", "=".repeat(60));
}

/// Load CSV with multiple fallback strategies
fn load_csv_with_fallbacks(path: &str) -> Result<DataFrame> {
    // Strategy 1: Standard loading with quote handling
    match CsvReadOptions::default()
        .with_infer_schema_length(Some(100))
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish()
    {
        Ok(df) => return Ok(df),
        Err(e) => {
            debug!("Standard loading failed: {}", e);
        }
    }

    // Strategy 2: Without quote handling
    CsvReadOptions::default()
        .with_infer_schema_length(Some(100))
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish()
        .map_err(|e| anyhow!("Could not parse {}: {}", path, e))
}
