//! CLI entry point for the hourly SOFA scorer.
//!
//! `score` loads the input feeds, scores every stay and writes the hourly
//! rows plus a batch summary. `validate` only loads and checks the inputs.

use anyhow::{Result, ensure};
use clap::{Parser, Subcommand};
use sofa_hourly::config::ScoringConfig;
use sofa_hourly::inputs::partition::partition;
use sofa_hourly::inputs::source::{CsvDirSource, EventSource};
use sofa_hourly::output::{append_scores, print_pretty, write_scores, write_summary};
use sofa_hourly::pipeline::run_batch;
use std::ffi::OsStr;
use std::path::Path;
use tracing::{error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "sofa_hourly")]
#[command(about = "Hourly SOFA scores from ICU event feeds", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score every stay in an input directory
    Score {
        /// Directory holding stays.csv and the event feed CSVs
        #[arg(short, long, default_value = "data")]
        input: String,

        /// CSV file to write hourly score rows to
        #[arg(short, long, default_value = "sofa_hourly.csv")]
        output: String,

        /// Gzip compress the score rows
        #[arg(long, default_value_t = false)]
        gzip: bool,

        /// Append score rows to an existing CSV instead of replacing it
        #[arg(long, default_value_t = false)]
        append: bool,

        /// JSON file to write the per-stay batch summary to
        #[arg(short, long, default_value = "sofa_summary.json")]
        summary: String,

        /// Optional JSON scoring config
        #[arg(short, long)]
        config: Option<String>,

        /// Maximum number of stays scored concurrently (overrides config)
        #[arg(long)]
        concurrency: Option<usize>,
    },
    /// Load and check the input feeds without scoring
    Validate {
        /// Directory holding stays.csv and the event feed CSVs
        #[arg(short, long, default_value = "data")]
        input: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/sofa_hourly.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("sofa_hourly.log"));

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
        Commands::Score {
            input,
            output,
            gzip,
            append,
            summary,
            config,
            concurrency,
        } => {
            ensure!(!(gzip && append), "--gzip and --append cannot be combined");

            let mut scoring = match config {
                Some(path) => ScoringConfig::load(&path)?,
                None => ScoringConfig::default(),
            };
            if let Some(concurrency) = concurrency {
                scoring.concurrency = concurrency;
            }
            scoring.validate()?;

            score(&input, &output, gzip, append, &summary, &scoring).await?;
        }
        Commands::Validate { input } => {
            validate(&input).await?;
        }
    }

    Ok(())
}

/// Loads, scores and writes one batch.
#[tracing::instrument(skip(config))]
async fn score(
    input: &str,
    output: &str,
    gzip: bool,
    append: bool,
    summary_path: &str,
    config: &ScoringConfig,
) -> Result<()> {
    let inputs = CsvDirSource::new(input).load().await?;
    let partitioned = partition(inputs);

    let report = run_batch(partitioned, config).await;
    if append {
        append_scores(output, report.rows())?;
    } else {
        write_scores(output, report.rows(), gzip)?;
    }
    write_summary(summary_path, &report.summary)?;
    print_pretty(&report.summary);

    for outcome in report.summary.outcomes.iter().filter(|o| o.error.is_some()) {
        error!(
            stay_id = outcome.stay_id,
            error = outcome.error.as_deref().unwrap_or_default(),
            "Stay not scored"
        );
    }

    info!(
        scored = report.summary.stays_scored,
        failed = report.summary.stays_failed,
        flagged_samples = report.summary.flagged_samples(),
        rows = report.summary.rows,
        "Scoring run complete"
    );
    Ok(())
}

/// Reports feed sizes and integrity failures without scoring.
#[tracing::instrument]
async fn validate(input: &str) -> Result<()> {
    let inputs = CsvDirSource::new(input).load().await?;
    for (feed, rows) in inputs.feed_counts() {
        info!(feed, rows, "Feed");
    }

    let partitioned = partition(inputs);
    for err in &partitioned.rejected {
        warn!(stay_id = err.stay_id(), error = %err, "Stay rejected");
    }

    info!(
        valid_stays = partitioned.stays.len(),
        rejected_stays = partitioned.rejected.len(),
        orphan_events = partitioned.orphan_events,
        "Validation summary"
    );
    Ok(())
}
