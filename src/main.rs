//! Shelf-Scout main entry point
//!
//! This is the command-line interface for the Shelf-Scout listing
//! harvester and ranker.

use anyhow::{anyhow, bail};
use clap::Parser;
use shelf_scout::config::{load_config_with_hash, Config};
use shelf_scout::crawler::{Coordinator, HttpPager};
use shelf_scout::listing::Listing;
use shelf_scout::output::{self, print_report, DatasetReport, ExportFormat};
use shelf_scout::scoring::{score_batch, ScoringMethod};
use shelf_scout::storage::{open_storage, SessionStatus, SqliteStorage, Storage};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use url::Url;

/// Shelf-Scout: a listing harvester and Bayesian ranker
///
/// Shelf-Scout walks e-commerce search-result pages one at a time,
/// deduplicates the listings it finds, ranks them with a configurable
/// Bayesian-style scoring method, and exports the result as CSV or JSON.
#[derive(Parser, Debug)]
#[command(name = "shelf-scout")]
#[command(version = "1.0.0")]
#[command(about = "A listing harvester and Bayesian ranker", long_about = None)]
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

    /// Start a fresh crawl, skipping recovery of an interrupted session
    #[arg(long)]
    fresh: bool,

    /// Validate config and show what would be collected without crawling
    #[arg(long, conflicts_with_all = ["stats", "rescore"])]
    dry_run: bool,

    /// Show the latest stored session and its dataset report, then exit
    #[arg(long, conflicts_with_all = ["dry_run", "rescore"])]
    stats: bool,

    /// Rescore the latest stored session with the given method and
    /// re-export
    #[arg(long, value_name = "METHOD", conflicts_with_all = ["dry_run", "stats"])]
    rescore: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if let Some(method) = cli.rescore {
        handle_rescore(&config, &method)?;
    } else {
        handle_crawl(config, config_hash, cli.fresh).await?;
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
            0 => EnvFilter::new("shelf_scout=info,warn"),
            1 => EnvFilter::new("shelf_scout=debug,info"),
            2 => EnvFilter::new("shelf_scout=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows what would run
fn handle_dry_run(config: &Config) {
    println!("=== Shelf-Scout Dry Run ===\n");

    println!("Crawl:");
    println!("  Start URL: {}", config.crawl.start_url);
    println!(
        "  Page limit: {}",
        config
            .crawl
            .page_limit
            .map_or("unbounded".to_string(), |l| l.to_string())
    );
    println!(
        "  Navigation timeout: {}ms",
        config.crawl.navigation_timeout_ms
    );
    println!("  Watchdog timeout: {}ms", config.crawl.watchdog_timeout_ms);
    println!("  Settle delay: {}ms", config.crawl.settle_delay_ms);
    println!("  User agent: {}", config.crawl.user_agent);

    println!("\nScoring:");
    println!("  Method: {}", config.scoring.method());
    if let (Some(c), Some(m)) = (config.scoring.custom_c, config.scoring.custom_m) {
        println!("  Custom prior: C = {c}, m = {m}");
    }
    if let Some(preset) = &config.scoring.custom_preset {
        println!("  Custom preset: {preset}");
    }

    println!("\nSelectors:");
    println!("  Listing container: {}", config.selectors.listing);
    println!("  Title: {}", config.selectors.title);
    println!(
        "  Next-page strategies ({}):",
        config.selectors.next_page.len()
    );
    for strategy in &config.selectors.next_page {
        println!("    - {strategy}");
    }

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    println!(
        "  Export: {} ({})",
        config.output.export_path, config.output.format
    );

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows the latest stored session
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    let storage = open_storage(Path::new(&config.output.database_path))?;

    let Some(session) = storage.get_latest_session()? else {
        println!("No sessions found in {}", config.output.database_path);
        return Ok(());
    };

    println!("Session {} ({})", session.id, session.status.to_db_string());
    println!("  Started: {}", session.started_at);
    if let Some(finished) = &session.finished_at {
        println!("  Finished: {finished}");
    }
    if let Some(reason) = &session.stop_reason {
        println!("  Stop reason: {reason}");
    }
    println!("  Pages visited: {}", session.pages_visited);
    println!("  Duplicates dropped: {}", session.duplicates_dropped);
    println!();

    let listings = storage.load_listings(session.id)?;
    print_report(&DatasetReport::compute(&listings));

    Ok(())
}

/// Handles the --rescore mode: rescores the latest session and re-exports
fn handle_rescore(config: &Config, method_name: &str) -> anyhow::Result<()> {
    let Some(method) = ScoringMethod::from_name(method_name) else {
        bail!(
            "Unknown scoring method '{}'; expected one of: {}",
            method_name,
            ScoringMethod::all_methods()
                .iter()
                .map(|m| m.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
    };

    let mut storage = open_storage(Path::new(&config.output.database_path))?;
    let session = storage
        .get_latest_session()?
        .ok_or_else(|| anyhow!("No stored session to rescore"))?;

    let mut listings = storage.load_listings(session.id)?;
    if listings.is_empty() {
        println!("Session {} holds no listings", session.id);
        return Ok(());
    }

    let params = config.scoring.resolve_params(&listings);
    score_batch(&mut listings, method, params);
    storage.update_scores(session.id, &listings)?;

    export_listings(config, &listings)?;
    print_report(&DatasetReport::compute(&listings));
    println!(
        "✓ Rescored {} listings with {} and exported to {}",
        listings.len(),
        method,
        config.output.export_path
    );

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, config_hash: String, fresh: bool) -> anyhow::Result<()> {
    let mut storage = open_storage(Path::new(&config.output.database_path))?;

    // An interrupted session means the process died mid-crawl; recover its
    // partial results instead of silently starting over
    if !fresh {
        if let Some(session) = storage.get_latest_session()? {
            if session.status == SessionStatus::Running {
                tracing::warn!(
                    "Found interrupted session {} ({} pages visited), recovering partial results",
                    session.id,
                    session.pages_visited
                );
                recover_session(&mut storage, &config, session.id)?;
                println!(
                    "Recovered interrupted session {}; rerun with --fresh to start a new crawl",
                    session.id
                );
                return Ok(());
            }
        }
    }

    let session_id = storage.create_session(&config_hash, config.crawl.page_limit)?;

    let start = Url::parse(&config.crawl.start_url)?;
    let mut pager = HttpPager::new(config.selectors.clone(), &config.crawl.user_agent)?;
    pager
        .open(&start)
        .await
        .map_err(|e| anyhow!("Failed to load start page: {e}"))?;

    let coordinator = Coordinator::new(pager, &config.crawl, config.scoring.clone())
        .with_checkpointing(storage, session_id);

    // Ctrl-C finishes with partial results instead of dropping them
    let cancel = coordinator.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing with partial results");
            cancel.cancel();
        }
    });

    let outcome = coordinator.run().await;

    if outcome.is_empty() {
        println!("No listings found ({})", outcome.stop_reason);
        return Ok(());
    }

    export_listings(&config, &outcome.listings)?;
    print_report(&DatasetReport::compute(&outcome.listings));
    println!(
        "✓ Exported {} listings to {} ({} pages, {} duplicates dropped, stop: {})",
        outcome.listings.len(),
        config.output.export_path,
        outcome.pages_visited,
        outcome.duplicates_dropped,
        outcome.stop_reason
    );

    Ok(())
}

/// Scores, exports, and closes out an interrupted session's partial batch
fn recover_session(
    storage: &mut SqliteStorage,
    config: &Config,
    session_id: i64,
) -> anyhow::Result<()> {
    let mut listings = storage.load_listings(session_id)?;
    if listings.is_empty() {
        storage.mark_recovered(session_id)?;
        println!("Interrupted session {session_id} held no listings");
        return Ok(());
    }

    let params = config.scoring.resolve_params(&listings);
    score_batch(&mut listings, config.scoring.method(), params);
    storage.update_scores(session_id, &listings)?;
    storage.mark_recovered(session_id)?;

    export_listings(config, &listings)?;
    print_report(&DatasetReport::compute(&listings));
    Ok(())
}

/// Writes the scored batch to the configured export path
fn export_listings(config: &Config, listings: &[Listing]) -> anyhow::Result<()> {
    let format = ExportFormat::from_name(&config.output.format).unwrap_or(ExportFormat::Csv);
    output::export(listings, Path::new(&config.output.export_path), format)?;
    Ok(())
}
