//! Offerhound main entry point
//!
//! Command-line interface for the offerhound product-offer crawler.

use anyhow::Context;
use clap::Parser;
use offerhound::config::{load_config_with_hash, validate, Config};
use offerhound::output::print_summary;
use offerhound::queue::{SqliteQueue, WorkQueue};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Offerhound: a product-offer crawler
///
/// Offerhound drives a three-stage crawl over an e-commerce site (search
/// results, product descriptions, seller offers) and writes one JSON
/// record per offer to a dataset file.
#[derive(Parser, Debug)]
#[command(name = "offerhound")]
#[command(version = "1.0.0")]
#[command(about = "A product-offer crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Search keyword, overriding the configuration file
    #[arg(short, long)]
    keyword: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Resume an interrupted crawl (default behavior)
    #[arg(long, conflicts_with = "fresh")]
    resume: bool,

    /// Start a fresh crawl, dropping previously queued work
    #[arg(long, conflicts_with = "resume")]
    fresh: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show queue statistics and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load configuration, apply overrides, then validate
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) =
        load_config_with_hash(&cli.config).context("failed to load configuration")?;

    if let Some(keyword) = cli.keyword {
        config.search.keyword = keyword;
    }
    validate(&config).context("invalid configuration")?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_crawl(config, cli.fresh, &config_hash).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("offerhound=info,warn"),
            1 => EnvFilter::new("offerhound=debug,info"),
            2 => EnvFilter::new("offerhound=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows the crawl plan
fn handle_dry_run(config: &Config) {
    println!("=== Offerhound Dry Run ===\n");

    println!("Search:");
    println!("  Keyword: {}", config.search.keyword);

    println!("\nCrawler:");
    println!(
        "  Max requests per crawl: {}",
        config.crawler.max_requests_per_crawl
    );
    println!("  Max request retries: {}", config.crawler.max_request_retries);
    println!(
        "  Max concurrent pages: {}",
        config.crawler.max_concurrent_pages
    );

    println!("\nSite:");
    println!("  Base URL: {}", config.site.base_url);
    println!("  Result item selector: {}", config.site.selectors.result_item);
    println!("  Offer row selector: {}", config.site.selectors.offer_row);

    println!("\nOutput:");
    println!("  Queue: {}", config.output.queue_path);
    println!("  Dataset: {}", config.output.dataset_path);

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would seed one search item for keyword '{}'",
        config.search.keyword
    );
}

/// Handles the --stats mode: shows queue statistics
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    use std::path::Path;

    println!("Queue database: {}\n", config.output.queue_path);

    let queue = SqliteQueue::new(Path::new(&config.output.queue_path))?;

    if let Some(run) = queue.latest_run()? {
        println!("Latest run: {} (keyword '{}')", run.id, run.keyword);
        println!("  Started: {}", run.started_at);
        match &run.finished_at {
            Some(finished) => println!("  Finished: {}", finished),
            None => println!("  Finished: still running or interrupted"),
        }
        println!("  Config hash: {}", run.config_hash);
        println!();
    } else {
        println!("No runs recorded yet.\n");
    }

    let counts = queue.counts()?;
    println!("Work items:");
    println!("  Pending: {}", counts.pending);
    println!("  In flight: {}", counts.in_flight);
    println!("  Done: {}", counts.done);
    println!("  Failed: {}", counts.failed);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, fresh: bool, config_hash: &str) -> anyhow::Result<()> {
    if fresh {
        tracing::info!("Starting fresh crawl (dropping previously queued work)");
    } else {
        tracing::info!("Starting crawl (will resume if interrupted run exists)");
    }

    match offerhound::crawl(config, fresh, config_hash).await {
        Ok(stats) => {
            print_summary(&stats);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
