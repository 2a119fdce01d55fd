//! Job-Harvest main entry point
//!
//! This is the command-line interface for the Job-Harvest posting ingester.

use anyhow::Context;
use clap::Parser;
use job_harvest::config::{load_config_with_hash, Config};
use job_harvest::crawler::user_agent_string;
use job_harvest::ingest::{Ingestor, Trigger};
use job_harvest::output::{load_statistics, print_statistics};
use job_harvest::storage::open_storage;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing_subscriber::EnvFilter;

/// Job-Harvest: incremental job posting ingestion
///
/// Job-Harvest walks a paginated job listing, skips every posting it has already
/// stored, and fetches and stores only the new ones.
#[derive(Parser, Debug)]
#[command(name = "job-harvest")]
#[command(version = "1.0.0")]
#[command(about = "Incremental job posting ingester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and print the effective settings
    #[arg(long, conflicts_with_all = ["stats", "every"])]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "every"])]
    stats: bool,

    /// Keep running, triggering an ingestion every SECS seconds
    #[arg(long, value_name = "SECS", conflicts_with_all = ["dry_run", "stats"])]
    every: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_ingest(&config, config_hash, cli.every).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("job_harvest=info,warn"),
            1 => EnvFilter::new("job_harvest=debug,info"),
            2 => EnvFilter::new("job_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== Job-Harvest Dry Run ===\n");

    println!("Source:");
    println!("  Listing URL: {}", config.source.listing_url);
    println!(
        "  Max consecutive page failures: {}",
        config.source.max_consecutive_page_failures
    );
    println!("  Detail concurrency: {}", config.source.detail_concurrency);

    println!("\nUser Agent:");
    println!("  {}", user_agent_string(&config.user_agent));

    println!("\nRetry:");
    println!("  Max attempts: {}", config.retry.max_attempts);
    println!("  Delay: {}s", config.retry.delay_secs);

    println!("\nListing Selectors:");
    println!("  Item: {}", config.selectors.listing.item);
    println!(
        "  Reference attribute: {}",
        config.selectors.listing.reference_attribute
    );
    println!("  Next page marker: {}", config.selectors.listing.next_page_marker);

    println!("\nDetail Selectors:");
    for (name, selector) in config.selectors.detail.named() {
        println!("  {}: {}", name, selector);
    }

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let storage = open_storage(Path::new(&config.output.database_path))
        .context("Failed to open database")?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles ingestion, either a single run or a recurring schedule
async fn handle_ingest(
    config: &Config,
    config_hash: String,
    every: Option<u64>,
) -> anyhow::Result<()> {
    let storage = open_storage(Path::new(&config.output.database_path))
        .context("Failed to open database")?;
    let ingestor = Ingestor::new(config, storage, config_hash)?;
    let trigger = Trigger::new(ingestor);

    let Some(secs) = every else {
        let summary = trigger.fire().wait().await?;
        tracing::info!(
            "Ingestion finished: {} references, {} new, {} committed",
            summary.report.references_found,
            summary.report.novel_urls,
            summary.report.committed
        );
        return Ok(());
    };

    tracing::info!("Triggering an ingestion every {}s; press Ctrl-C to stop", secs);
    let mut interval = tokio::time::interval(Duration::from_secs(secs.max(1)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if trigger.is_running() {
                    tracing::warn!("Previous run still in progress; skipping this trigger");
                    continue;
                }

                let ticket = trigger.fire();
                let sequence = ticket.sequence();
                tokio::spawn(async move {
                    match ticket.wait().await {
                        Ok(summary) => tracing::info!(
                            "Run #{} committed {} new postings",
                            sequence,
                            summary.report.committed
                        ),
                        Err(e) => tracing::error!("Run #{} failed: {}", sequence, e),
                    }
                });
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                break;
            }
        }
    }

    Ok(())
}
