//! CLI entry point for the drilling data processor.

use anyhow::{Context, Result, anyhow};
use clap::{Parser, ValueEnum};
use drill_processing::pipeline::io::write_frame;
use drill_processing::{
    DrillingProcessor, ImputationStrategy, OutlierMethod, ProcessingError, ProcessorConfig,
    QualityReport,
};
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// CLI-compatible imputation strategy enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliImputation {
    /// Use the mean of non-null values
    Mean,
    /// Use the median of non-null values
    Median,
    /// Use the most frequent value
    MostFrequent,
    /// Use zero as the fill value
    Zero,
}

impl From<CliImputation> for ImputationStrategy {
    fn from(cli: CliImputation) -> Self {
        match cli {
            CliImputation::Mean => ImputationStrategy::Mean,
            CliImputation::Median => ImputationStrategy::Median,
            CliImputation::MostFrequent => ImputationStrategy::MostFrequent,
            CliImputation::Zero => ImputationStrategy::Zero,
        }
    }
}

/// CLI-compatible outlier method enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliOutlierMethod {
    /// Isolation forest anomaly scores
    IsolationForest,
    /// Interquartile range fences
    Iqr,
    /// Standard score threshold
    Zscore,
}

impl From<CliOutlierMethod> for OutlierMethod {
    fn from(cli: CliOutlierMethod) -> Self {
        match cli {
            CliOutlierMethod::IsolationForest => OutlierMethod::IsolationForest,
            CliOutlierMethod::Iqr => OutlierMethod::Iqr,
            CliOutlierMethod::Zscore => OutlierMethod::ZScore,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Drilling data processing pipeline",
    long_about = "Cleans, filters and enriches drilling measurement data.\n\n\
                  Stages: clean -> handle outliers -> engineer features -> check quality\n\n\
                  EXAMPLES:\n  \
                  # Process a parquet file with defaults\n  \
                  drill-processing -i well_17.parquet -o well_17_clean.parquet\n\n  \
                  # IQR filtering and a JSON report\n  \
                  drill-processing -i well_17.csv --outlier-method iqr -r report.json\n\n  \
                  # Options from a JSON file, report to stdout\n  \
                  drill-processing -i well_17.parquet -c options.json --json"
)]
struct Args {
    /// Input dataset (.parquet, .pq, .csv, .ipc, .arrow, .feather)
    #[arg(short, long)]
    input: PathBuf,

    /// JSON file of processing options
    ///
    /// Command line flags override values from this file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Strategy for imputing missing numeric values
    #[arg(long, value_enum)]
    imputation: Option<CliImputation>,

    /// Method used to flag outlier rows
    #[arg(long, value_enum)]
    outlier_method: Option<CliOutlierMethod>,

    /// Keep rows flagged as outliers
    #[arg(long)]
    keep_outliers: bool,

    /// Skip depth gradients and mechanical drilling features
    #[arg(long)]
    no_formation_features: bool,

    /// Write the processed dataset (.parquet, .csv, .ipc)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write the quality report as JSON
    #[arg(short, long)]
    report: Option<PathBuf>,

    /// Output the quality report as JSON to stdout
    ///
    /// Disables all logs; only the JSON report (or error) is printed.
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Only show warnings and errors
    #[arg(short, long)]
    quiet: bool,
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

    let config = build_config(&args)?;
    let mut processor = DrillingProcessor::new(config)?;

    let outcome = processor.load(&args.input).and_then(|()| processor.run().map(|_| ()));
    if let Err(e) = outcome {
        return Err(report_failure(e, args.json));
    }

    if let Some(output) = &args.output {
        let mut data = processor
            .data()
            .cloned()
            .ok_or_else(|| anyhow!("No processed data available"))?;
        write_frame(&mut data, output)
            .with_context(|| format!("writing {}", output.display()))?;
        info!("Processed data written to: {}", output.display());
    }

    let report = processor
        .quality_report()
        .ok_or_else(|| anyhow!("No quality report available"))?;

    if let Some(path) = &args.report {
        write_report(report, path)?;
        info!("Report written to: {}", path.display());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    print_summary(report, &args);
    Ok(())
}

/// Start from the options file, if any, then apply command line overrides.
fn build_config(args: &Args) -> Result<ProcessorConfig> {
    let mut config = match &args.config {
        Some(path) => ProcessorConfig::from_file(path)?,
        None => ProcessorConfig::default(),
    };

    if let Some(imputation) = args.imputation {
        config.imputation_strategy = imputation.into();
    }
    if let Some(method) = args.outlier_method {
        config.outliers.method = method.into();
    }
    if args.keep_outliers {
        config.remove_outliers = false;
    }
    if args.no_formation_features {
        config.features.add_formation_features = false;
    }

    config.validate()?;
    Ok(config)
}

fn report_failure(e: ProcessingError, json_output: bool) -> anyhow::Error {
    if json_output {
        match serde_json::to_string_pretty(&e) {
            Ok(json) => println!("{}", json),
            Err(ser) => error!("Could not serialize error: {}", ser),
        }
    } else {
        error!("Processing failed: {}", e);
    }
    e.into()
}

fn write_report(report: &QualityReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Print a human-readable summary.
///
/// Uses `println!` intentionally: this is the primary CLI output and should
/// be visible regardless of the log level.
fn print_summary(report: &QualityReport, args: &Args) {
    println!();
    println!("{}", "=".repeat(60));
    println!("DRILLING DATA PROCESSING SUMMARY");
    println!("{}", "=".repeat(60));
    println!("Input:         {}", args.input.display());
    println!("Rows:          {}", report.row_count);
    println!("Columns:       {}", report.column_count);
    println!("Completeness:  {:.1}%", report.completeness * 100.0);
    println!("Duplicates:    {}", report.duplicate_rows);
    println!("Quality score: {:.3}", report.score);

    if report.has_issues() {
        println!();
        println!("Issues:");
        for issue in &report.issues {
            println!("  - [{}] {}: {}", issue.kind, issue.column, issue.message);
        }
    }

    if let Some(output) = &args.output {
        println!();
        println!("Output: {}", output.display());
    }
    println!("{}", "=".repeat(60));
}
