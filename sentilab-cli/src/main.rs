//! SentiLab CLI: sentiment and returns commands.
//!
//! Commands:
//! - `sentiment`: build the daily sentiment table for a date range
//! - `returns`: build the daily returns table for a list of tickers
//!
//! Logging goes to stderr; set `RUST_LOG` to change the level (default `info`).
//! Ctrl-C during `sentiment` stops scheduling new units; what finished is still written.

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use sentilab_core::news::{FeedFetcher, GoogleNewsSource, HttpProbe};
use sentilab_core::prices::{CircuitBreaker, YahooProvider};
use sentilab_core::sentiment::{ScoringPipeline, VaderScorer};
use sentilab_core::{CancelToken, ClassificationConfig};
use sentilab_runner::{
    collect_returns, default_return_tickers, manifest_path_for, save_manifest, save_returns_csv, save_sentiment_csv,
    DateRangeDriver, RunConfig, RunManifest, TracingProgress,
};

const FEED_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Parser)]
#[command(
    name = "sentilab",
    about = "SentiLab CLI: daily news sentiment and price returns per instrument"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify daily news sentiment per instrument and write the CSV table.
    Sentiment(SentimentArgs),
    /// Compute daily close-to-close returns and write the wide CSV table.
    Returns {
        /// Tickers, in column order. Defaults to a built-in large-cap list.
        #[arg(long, num_args = 1..)]
        tickers: Vec<String>,

        /// First date (YYYY-MM-DD).
        #[arg(long, value_parser = parse_date)]
        start: NaiveDate,

        /// End date (YYYY-MM-DD), exclusive.
        #[arg(long, value_parser = parse_date)]
        end: NaiveDate,

        #[arg(long, default_value = "data/daily_returns.csv")]
        output: PathBuf,
    },
}

#[derive(Args)]
struct SentimentArgs {
    /// TOML run config. Flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Instruments to analyse. Defaults to the config's list, or the built-in universe.
    #[arg(long, num_args = 1..)]
    instruments: Vec<String>,

    /// First business day (YYYY-MM-DD), inclusive.
    #[arg(long, value_parser = parse_date)]
    start: Option<NaiveDate>,

    /// Last business day (YYYY-MM-DD), inclusive.
    #[arg(long, value_parser = parse_date)]
    end: Option<NaiveDate>,

    /// Output CSV path.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Scores at or above this are bullish.
    #[arg(long, allow_negative_numbers = true)]
    bull: Option<f64>,

    /// Scores at or below this are bearish.
    #[arg(long, allow_negative_numbers = true)]
    bear: Option<f64>,

    /// Days of news before each business day.
    #[arg(long)]
    lookback: Option<u32>,

    /// Units processed concurrently.
    #[arg(long)]
    workers: Option<usize>,

    /// Attempts per feed query before the unit fails (0 = retry until stopped).
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Also log a VADER score for every article.
    #[arg(long, default_value_t = false)]
    diagnostics: bool,
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("invalid date '{s}' (expected YYYY-MM-DD): {e}"))
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Sentiment(args) => run_sentiment(args),
        Commands::Returns {
            tickers,
            start,
            end,
            output,
        } => run_returns(tickers, start, end, output),
    }
}

/// Config file (if any) with command-line overrides applied, then validated.
fn resolve_config(args: SentimentArgs) -> Result<RunConfig> {
    let mut config = match &args.config {
        Some(path) => RunConfig::from_file(path)?,
        None => {
            let start = args.start.ok_or_else(|| anyhow!("--start is required without --config"))?;
            let end = args.end.ok_or_else(|| anyhow!("--end is required without --config"))?;
            RunConfig::new(start, end)
        }
    };

    if !args.instruments.is_empty() {
        config.instruments = args.instruments;
    }
    if let Some(start) = args.start {
        config.start_date = start;
    }
    if let Some(end) = args.end {
        config.end_date = end;
    }
    if let Some(output) = args.output {
        config.output = output;
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if let Some(max_attempts) = args.max_attempts {
        config.retry.max_attempts = max_attempts;
    }
    if args.diagnostics {
        config.diagnostics = true;
    }

    let current = config.classification;
    config.classification = ClassificationConfig::new(
        args.bull.unwrap_or(current.bull_threshold()),
        args.bear.unwrap_or(current.bear_threshold()),
        args.lookback.unwrap_or(current.lookback_days()),
    )?;

    config.validate()?;
    Ok(config)
}

fn run_sentiment(args: SentimentArgs) -> Result<()> {
    let config = resolve_config(args)?;
    let cancel = CancelToken::new();
    install_interrupt_handler(cancel.clone())?;
    execute_sentiment(&config, cancel)
}

/// Cancel `token` on the first Ctrl-C. Units already running finish; no new ones start.
fn install_interrupt_handler(token: CancelToken) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build signal runtime")?;
    std::thread::Builder::new()
        .name("interrupt".into())
        .spawn(move || {
            runtime.block_on(async {
                match tokio::signal::ctrl_c().await {
                    Ok(()) => {
                        tracing::warn!("interrupt received, finishing in-flight units");
                        token.cancel();
                    }
                    Err(e) => tracing::warn!(error = %e, "cannot listen for Ctrl-C"),
                }
            })
        })
        .context("failed to spawn interrupt listener")?;
    Ok(())
}

fn execute_sentiment(config: &RunConfig, cancel: CancelToken) -> Result<()> {
    let fingerprint = config.fingerprint()?;
    tracing::info!(
        instruments = ?config.instruments,
        start = %config.start_date,
        end = %config.end_date,
        fingerprint = %fingerprint,
        "resolved run config"
    );

    let source = GoogleNewsSource::new(FEED_TIMEOUT).context("failed to build feed client")?;
    let probe = HttpProbe::default_endpoint().context("failed to build connectivity probe")?;
    let fetcher =
        FeedFetcher::new(Arc::new(source), Arc::new(probe), config.retry_policy()?).with_cancel(cancel.clone());

    let mut scorer = ScoringPipeline::default();
    if config.diagnostics {
        scorer = scorer.with_diagnostic(Box::new(VaderScorer::new()));
    }

    let progress = TracingProgress;
    let report = DateRangeDriver::new(&fetcher, &scorer, config.classification)
        .with_workers(config.workers)
        .with_failure_policy(config.on_unit_error)
        .with_cancel(cancel)
        .with_progress(&progress)
        .run(&config.instruments, config.start_date, config.end_date)?;

    // Write whatever was collected before reporting any failure.
    let table = save_sentiment_csv(&config.output, &report.records);
    let manifest_path = manifest_path_for(&config.output);
    let manifest = save_manifest(&manifest_path, &RunManifest::new(config, fingerprint, &report));
    table.context("failed to write sentiment table")?;
    manifest.context("failed to write run manifest")?;

    for failure in &report.failures {
        eprintln!("Failed {} on {}: {}", failure.instrument, failure.date, failure.error);
    }
    if report.aborted || report.cancelled {
        bail!(
            "run {} early; {} of {} units written to {}",
            if report.cancelled { "cancelled" } else { "aborted" },
            report.records.len(),
            report.units_planned,
            config.output.display()
        );
    }

    println!(
        "Wrote {} rows ({} articles) to {}",
        report.records.len(),
        report.articles(),
        config.output.display()
    );
    Ok(())
}

fn run_returns(tickers: Vec<String>, start: NaiveDate, end: NaiveDate, output: PathBuf) -> Result<()> {
    if start >= end {
        bail!("--start ({start}) must be before --end ({end})");
    }
    let tickers = if tickers.is_empty() {
        default_return_tickers()
    } else {
        tickers
    };

    let breaker = Arc::new(CircuitBreaker::default_provider());
    let provider = YahooProvider::new(breaker).context("failed to build price client")?;
    let summary = collect_returns(&provider, &tickers, start, end, &CancelToken::new());

    for (ticker, err) in &summary.skipped {
        eprintln!("Skipped {ticker}: {err}");
    }
    if summary.table.tickers().is_empty() {
        bail!("no returns computed for any of {} ticker(s)", tickers.len());
    }

    save_returns_csv(&output, &summary.table).context("failed to write returns table")?;
    println!(
        "Wrote {} rows x {} tickers to {}",
        summary.table.len(),
        summary.table.tickers().len(),
        output.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentilab_runner::load_manifest;

    fn sentiment_args(argv: &[&str]) -> SentimentArgs {
        let mut full = vec!["sentilab", "sentiment"];
        full.extend_from_slice(argv);
        match Cli::try_parse_from(full).unwrap().command {
            Commands::Sentiment(args) => args,
            Commands::Returns { .. } => panic!("parsed the wrong subcommand"),
        }
    }

    #[test]
    fn flags_without_config_use_defaults() {
        let config = resolve_config(sentiment_args(&["--start", "2024-01-01", "--end", "2024-01-07"])).unwrap();
        assert_eq!(config.instruments.len(), 8);
        assert_eq!(config.classification, ClassificationConfig::default());
        assert_eq!(config.workers, 1);
    }

    #[test]
    fn flags_override_thresholds() {
        let config = resolve_config(sentiment_args(&[
            "--start",
            "2024-01-01",
            "--end",
            "2024-01-07",
            "--instruments",
            "ACME",
            "BETA",
            "--bull",
            "0.2",
            "--bear",
            "-0.2",
            "--lookback",
            "2",
            "--workers",
            "3",
        ]))
        .unwrap();
        assert_eq!(config.instruments, ["ACME", "BETA"]);
        assert_eq!(config.classification.bull_threshold(), 0.2);
        assert_eq!(config.classification.bear_threshold(), -0.2);
        assert_eq!(config.classification.lookback_days(), 2);
        assert_eq!(config.workers, 3);
    }

    #[test]
    fn contradictory_flags_are_rejected() {
        let err = resolve_config(sentiment_args(&[
            "--start",
            "2024-01-01",
            "--end",
            "2024-01-07",
            "--bull",
            "-0.1",
            "--bear",
            "0.1",
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("strictly below"));
    }

    #[test]
    fn missing_dates_without_config() {
        assert!(resolve_config(sentiment_args(&["--end", "2024-01-07"])).is_err());
    }

    #[test]
    fn cancelled_run_writes_empty_table_and_manifest_then_fails() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out").join("sentiment.csv");
        let mut config = resolve_config(sentiment_args(&["--start", "2024-01-01", "--end", "2024-01-05"])).unwrap();
        config.output = output.clone();

        let cancel = CancelToken::new();
        cancel.cancel();
        let err = execute_sentiment(&config, cancel).unwrap_err();
        assert!(err.to_string().contains("cancelled"), "{err}");

        let table = std::fs::read_to_string(&output).unwrap();
        assert_eq!(table.lines().count(), 1);
        let manifest = load_manifest(&manifest_path_for(&output)).unwrap();
        assert!(manifest.cancelled);
        assert_eq!(manifest.records, 0);
        assert_eq!(manifest.units_planned, 5 * 8);
    }

    #[test]
    fn interrupt_handler_installs() {
        install_interrupt_handler(CancelToken::new()).unwrap();
    }

    #[test]
    fn bad_date_is_a_parse_error() {
        assert!(Cli::try_parse_from(["sentilab", "sentiment", "--start", "01/02/2024"]).is_err());
    }
}
