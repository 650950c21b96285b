use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Instrument;

use feedharvest::config::{ConfigError, FeedsConfig};
use feedharvest::feed::{Fetcher, DEFAULT_TIMEOUT};
use feedharvest::harvest::{self, RunOptions, DEFAULT_MAX_ENTRIES};

#[derive(Parser, Debug)]
#[command(
    name = "feedharvest",
    about = "Collect configured feeds into a dated CSV snapshot"
)]
struct Args {
    /// Feed list (YAML)
    #[arg(long, env = "FEEDS_PATH", default_value = "config/feeds.yaml")]
    config: PathBuf,

    /// Directory receiving news_raw_{date}.csv
    #[arg(long, env = "HARVEST_OUTPUT_DIR", default_value = "data")]
    output_dir: PathBuf,

    /// Entries kept per source
    #[arg(long, default_value_t = DEFAULT_MAX_ENTRIES)]
    max_entries: usize,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT.as_secs())]
    timeout_secs: u64,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Line-oriented status on stdout; RUST_LOG overrides the info default
    tracing_subscriber::fmt()
        .with_writer(std::io::stdout)
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    run(args).instrument(tracing::info_span!("harvest")).await
}

async fn run(args: Args) -> Result<()> {
    let config = match FeedsConfig::load(&args.config) {
        Ok(config) => config,
        Err(ConfigError::NotFound(path)) => {
            tracing::error!(path = %path, "ERROR: feed config not found");
            std::process::exit(1);
        }
        Err(e) => {
            return Err(e)
                .with_context(|| format!("Failed to load feed config {}", args.config.display()));
        }
    };

    let fetcher = Fetcher::new(
        config.nitter_mirrors.clone(),
        Duration::from_secs(args.timeout_secs),
    )
    .context("Failed to build HTTP client")?;

    let options = RunOptions {
        output_dir: args.output_dir,
        date: Local::now().date_naive(),
        max_entries: args.max_entries,
    };

    let summary = harvest::run(&config, fetcher, &options)
        .await
        .context("Failed to write snapshot")?;

    tracing::info!(
        sources = summary.sources,
        failed = summary.failed_sources,
        rows = summary.rows,
        path = %summary.path.display(),
        "Run complete"
    );
    Ok(())
}
