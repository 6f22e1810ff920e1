//! Corpus-Harvest main entry point
//!
//! This is the command-line interface for the Corpus-Harvest web harvester.

use anyhow::Context;
use clap::Parser;
use corpus_harvest::config::{load_config_with_hash, Config};
use corpus_harvest::output::print_summary;
use corpus_harvest::Coordinator;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Corpus-Harvest: a resumable web harvester
///
/// Corpus-Harvest renders seed pages, falls back to plain HTTP when rendering
/// fails, and stores every in-scope page and linked file next to a JSON
/// sidecar. URLs processed by earlier runs are skipped.
#[derive(Parser, Debug)]
#[command(name = "corpus-harvest")]
#[command(version)]
#[command(about = "A resumable web harvester for offline corpora", long_about = None)]
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

    /// Ignore the saved frontier and process every URL again
    #[arg(long)]
    fresh: bool,

    /// Validate config and show what would be harvested without fetching anything
    #[arg(long)]
    dry_run: bool,

    /// Harvest only the configured seeds without expanding them from sitemaps
    ///
    /// The render engine's own `follow-sitemaps` setting is left unchanged.
    #[arg(long)]
    no_sitemaps: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config, !cli.no_sitemaps);
        return Ok(());
    }

    handle_harvest(config, cli.fresh, !cli.no_sitemaps).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("corpus_harvest=info,warn"),
            1 => EnvFilter::new("corpus_harvest=debug,info"),
            2 => EnvFilter::new("corpus_harvest=trace,debug"),
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

/// Handles the --dry-run mode: shows the resolved configuration
fn handle_dry_run(config: &Config, seed_expansion: bool) {
    println!("=== Corpus-Harvest Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Max pages per seed: {}", config.crawler.max_pages);
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Concurrency: {}", config.crawler.concurrency);
    println!("  Timeout: {}ms", config.crawler.timeout_ms);
    println!("  Render JS: {}", config.crawler.render_js);
    println!("  Follow sitemaps: {}", config.crawler.follow_sitemaps);
    println!(
        "  Expand seeds from sitemaps: {}",
        seed_expansion && config.crawler.follow_sitemaps
    );
    println!("  Seed workers: {}", config.crawler.seed_workers);
    println!("  User agent: {}", config.crawler.user_agent());

    println!("\nRenderer:");
    match &config.renderer.endpoint {
        Some(endpoint) => println!("  Endpoint: {}", endpoint),
        None => println!("  None (HTTP fallback only)"),
    }

    println!("\nScope:");
    println!("  Include patterns: {:?}", config.scope.include_patterns);
    println!("  Exclude patterns: {:?}", config.scope.exclude_patterns);
    println!("  Allowed domains: {:?}", config.scope.allowed_domains);
    println!("  File extensions: {:?}", config.scope.file_extensions);

    println!("\nOutput:");
    println!("  HTML: {}", config.output.html_dir);
    println!("  Files: {}", config.output.files_dir);
    println!("  Metadata: {}", config.output.meta_dir);
    println!("  Attempt log: {}", config.output.log_path);
    println!("  Frontier: {}", config.output.frontier_path);

    println!("\nSeeds ({}):", config.scope.seeds.len());
    for seed in &config.scope.seeds {
        println!("  * {}", seed);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main harvest, checkpointing the frontier on Ctrl-C
async fn handle_harvest(config: Config, fresh: bool, seed_expansion: bool) -> anyhow::Result<()> {
    let mut coordinator =
        Coordinator::new(config, fresh).context("Failed to prepare the harvest run")?;
    if !seed_expansion {
        coordinator.set_seed_expansion(false);
    }

    tokio::select! {
        summary = coordinator.run() => {
            print_summary(&summary);
            Ok(())
        }
        // An error from the signal listener disables this branch
        Ok(()) = tokio::signal::ctrl_c() => {
            coordinator.checkpoint();
            print_summary(&coordinator.summary());
            eprintln!("\nStopped by user");
            std::process::exit(1);
        }
    }
}
