//! CLI entry point for the EV demand materializer.
//!
//! Loads a full raw session extract, materializes the 5-minute, hourly,
//! daily and monthly demand series and persists them, optionally uploading
//! them to S3.

use anyhow::Result;
use clap::{Parser, Subcommand};
use ev_demand::{
    output::{print_json, write_report},
    pipeline::{self, DemandReport},
    source::load_raw_records,
    timeseries::SlotAlignment,
    upload::upload_artifacts,
};
use std::ffi::OsStr;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "ev_demand")]
#[command(about = "Materialize EV charging sessions into power-demand time series", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build and persist the demand series from a raw extract
    Run {
        /// Path to a .csv/.json/.jsonl extract, or a URL serving a JSON array
        #[arg(value_name = "FILE_OR_URL")]
        source: String,

        /// Directory the CSV artifacts and summary are written to
        #[arg(short, long, default_value = "data")]
        output_dir: String,

        /// Floor 5-minute slots onto the wall-clock grid instead of each
        /// session's own start
        #[arg(long, default_value_t = false)]
        calendar_grid: bool,

        /// Optional: S3 bucket name to upload artifacts to (e.g., "my-bucket")
        #[arg(long)]
        s3_bucket: Option<String>,

        /// Key prefix for uploaded artifacts
        #[arg(long, default_value = "demand")]
        s3_prefix: String,

        /// Optional: Gzip compress artifacts before uploading to S3
        #[arg(long, default_value_t = false)]
        gzip: bool,
    },
    /// Build the demand series and log statistics without writing anything
    Inspect {
        /// Path to a .csv/.json/.jsonl extract, or a URL serving a JSON array
        #[arg(value_name = "FILE_OR_URL")]
        source: String,

        /// Floor 5-minute slots onto the wall-clock grid
        #[arg(long, default_value_t = false)]
        calendar_grid: bool,
    },
}

fn alignment(calendar_grid: bool) -> SlotAlignment {
    if calendar_grid {
        SlotAlignment::Calendar
    } else {
        SlotAlignment::SessionStart
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/ev_demand.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("ev_demand.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            source,
            output_dir,
            calendar_grid,
            s3_bucket,
            s3_prefix,
            gzip,
        } => {
            let records = load_raw_records(&source).await?;
            let report = pipeline::run(&records, alignment(calendar_grid))?;
            let artifacts = write_report(Path::new(&output_dir), &report)?;

            match s3_bucket {
                Some(bucket) if !bucket.is_empty() => {
                    info!(bucket = %bucket, gzip, "S3 upload enabled");
                    let config = aws_config::load_from_env().await;
                    let s3 = aws_sdk_s3::Client::new(&config);
                    upload_artifacts(&s3, &bucket, &s3_prefix, &artifacts, gzip).await?;
                }
                _ => info!("S3 bucket not specified, skipping upload"),
            }

            info!(output_dir = %output_dir, "Finished materializing demand series");
        }
        Commands::Inspect {
            source,
            calendar_grid,
        } => {
            let records = load_raw_records(&source).await?;
            let report = pipeline::run(&records, alignment(calendar_grid))?;
            log_report(&report)?;
        }
    }

    Ok(())
}

/// Logs the run statistics and the size of each series.
fn log_report(report: &DemandReport) -> Result<()> {
    print_json(&report.stats)?;

    for series in &report.series {
        info!(
            granularity = series.granularity.name(),
            rows = series.rows.len(),
            "Series"
        );
    }

    let stats = &report.stats;
    info!(
        raw_records = stats.raw_records,
        sessions = stats.sessions,
        kept_pct = stats.kept_pct(),
        overstay_pct = stats.overstay_pct(),
        "Run summary"
    );
    Ok(())
}
