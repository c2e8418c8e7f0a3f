//! Mutuals main entry point
//!
//! This is the command-line interface for the reciprocal-friend network crawler.

use anyhow::{bail, Context};
use clap::Parser;
use mutuals::config::{load_config_with_hash, Config};
use mutuals::crawler::{cancel_pair, run_crawl};
use mutuals::output::{
    compute_statistics, print_statistics, read_graph, write_graph, write_statistics_report,
};
use mutuals::storage::{open_storage, Storage};
use mutuals::{AccountRef, MutualsError};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Mutuals: samples the reciprocal-friend network around a seed account
///
/// Mutuals expands a frontier of mutually-following accounts, keeping the
/// most popular few of each, until a target number of accounts is known.
/// Progress is checkpointed so interrupted crawls pick up where they stopped.
#[derive(Parser, Debug)]
#[command(name = "mutuals")]
#[command(version)]
#[command(about = "A reciprocal-friend network crawler", long_about = None)]
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

    /// Resume an interrupted crawl (default behavior)
    #[arg(long, conflicts_with = "fresh")]
    resume: bool,

    /// Start a fresh crawl, ignoring checkpoints
    #[arg(long, conflicts_with = "resume")]
    fresh: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with_all = ["stats", "export_graph"])]
    dry_run: bool,

    /// Compute network statistics from the graph file and exit
    #[arg(long, conflicts_with_all = ["dry_run", "export_graph"])]
    stats: bool,

    /// Rebuild the graph file from the latest checkpointed run and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    export_graph: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.export_graph {
        handle_export_graph(&config)?;
    } else {
        handle_crawl(&config, &config_hash, cli.fresh).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("mutuals=info,warn"),
            1 => EnvFilter::new("mutuals=debug,info"),
            2 => EnvFilter::new("mutuals=trace,debug"),
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
    println!("=== Mutuals Dry Run ===\n");

    println!("API:");
    println!("  Base URL: {}", config.api.base_url);
    println!("  Bearer token: {} characters", config.api.bearer_token.len());
    println!("  Timeout: {}s", config.api.timeout_secs);

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.client_name);
    println!("  Version: {}", config.user_agent.client_version);
    println!("  Contact URL: {}", config.user_agent.contact_url);

    println!("\nRetry:");
    println!("  Initial wait: {}s", config.retry.initial_wait_secs);
    println!("  Backoff multiplier: {}", config.retry.backoff_multiplier);
    println!("  Max server wait: {}s", config.retry.max_server_wait_secs);
    println!("  Max transient errors: {}", config.retry.max_transient_errors);
    println!("  Rate-limit window: {}s", config.retry.rate_limit_window_secs);

    println!("\nCrawl:");
    println!("  Seed: {}", AccountRef::parse(&config.crawl.seed));
    println!("  Per-node limit: {}", config.crawl.per_node_limit);
    println!("  Target threshold: {}", config.crawl.target_threshold);
    println!("  Top-K: {}", config.crawl.top_k);
    match config.crawl.max_passes {
        Some(max) => println!("  Max passes: {}", max),
        None => println!("  Max passes: unlimited"),
    }

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    println!("  Graph: {}", config.output.graph_path);
    println!("  Statistics: {}", config.output.stats_path);

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: reports on the graph file
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    let graph_path = Path::new(&config.output.graph_path);
    let graph = read_graph(graph_path)
        .with_context(|| format!("Failed to read graph from {}", graph_path.display()))?;

    let stats = compute_statistics(&graph);
    print_statistics(&stats);
    write_statistics_report(&stats, Path::new(&config.output.stats_path))?;

    println!("\n✓ Report written to: {}", config.output.stats_path);
    Ok(())
}

/// Handles the --export-graph mode: rewrites the graph file from checkpoints
fn handle_export_graph(config: &Config) -> anyhow::Result<()> {
    println!("=== Exporting Graph ===\n");
    println!("Database: {}", config.output.database_path);
    println!("Output: {}", config.output.graph_path);
    println!();

    let storage = open_storage(&config.output)?;
    let Some(run) = storage.get_latest_run()? else {
        bail!("No crawl runs found in {}", config.output.database_path);
    };

    tracing::info!("Loading expansions of run {} ({})", run.id, run.status.to_db_string());
    let graph = storage.load_expansions(run.id)?;
    write_graph(&graph, Path::new(&config.output.graph_path))?;

    println!(
        "✓ Exported {} expansions to: {}",
        graph.len(),
        config.output.graph_path
    );
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config, config_hash: &str, fresh: bool) -> anyhow::Result<()> {
    if fresh {
        tracing::info!("Starting fresh crawl (ignoring checkpoints)");
    } else {
        tracing::info!("Starting crawl (will resume if an unfinished run exists)");
    }

    let (handle, signal) = cancel_pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current request");
            handle.cancel();
        }
    });

    match run_crawl(config, config_hash, fresh, signal).await {
        Ok(graph) => {
            tracing::info!(
                "Crawl completed successfully: {} accounts expanded, {} distinct",
                graph.len(),
                graph.distinct_nodes().len()
            );
            Ok(())
        }
        Err(e @ MutualsError::Cancelled { .. }) => {
            tracing::warn!("Crawl interrupted; rerun to resume");
            Err(e.into())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
