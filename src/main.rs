//! Lingua-Sync main entry point
//!
//! This is the command-line interface for the Lingua-Sync language updater.

use clap::Parser;
use lingua_sync::config::{load_config_with_hash, Config};
use lingua_sync::storage::{open_storage, LanguageStore};
use lingua_sync::sync::{run_recorded_update, TracingProgress};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Lingua-Sync: keeps local language definitions current
///
/// Lingua-Sync downloads a bookmark manifest, fetches every language it
/// lists, merges newer versions into the local store and reports what
/// changed.
#[derive(Parser, Debug)]
#[command(name = "lingua-sync")]
#[command(version = "1.0.0")]
#[command(about = "Remote language definition updater", long_about = None)]
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

    /// Validate config and show where languages would be fetched from
    #[arg(long, conflicts_with_all = ["list", "history"])]
    dry_run: bool,

    /// List installed languages and exit
    #[arg(long, conflicts_with_all = ["dry_run", "history"])]
    list: bool,

    /// Show recent update runs and exit
    #[arg(long, conflicts_with_all = ["dry_run", "list"])]
    history: bool,
}

/// Number of runs shown by `--history`
const HISTORY_LIMIT: usize = 20;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

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

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.list {
        handle_list(&config)?;
    } else if cli.history {
        handle_history(&config)?;
    } else {
        handle_update(&config, &config_hash).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("lingua_sync=info,warn"),
            1 => EnvFilter::new("lingua_sync=debug,info"),
            2 => EnvFilter::new("lingua_sync=trace,debug"),
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
    println!("=== Lingua-Sync Dry Run ===\n");

    println!("Remote:");
    println!("  Manifest: {}", config.remote.manifest_url);
    println!("  Max attempts: {}", config.remote.max_attempts);
    println!("  Request timeout: {}s", config.remote.request_timeout_secs);
    println!("  Retry delay: {}ms", config.remote.retry_delay_ms);
    println!("  Poll interval: {}ms", config.remote.poll_interval_ms);
    println!("  HTTPS only: {}", config.remote.https_only);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nStore:");
    println!("  Database: {}", config.store.database_path);

    println!("\n✓ Configuration is valid");
}

/// Handles the --list mode: prints installed languages
fn handle_list(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    use lingua_sync::output::print_languages;

    let store = open_storage(Path::new(&config.store.database_path))?;
    print_languages(&store.languages()?);

    Ok(())
}

/// Handles the --history mode: prints recent update runs
fn handle_history(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    use lingua_sync::output::print_history;

    let store = open_storage(Path::new(&config.store.database_path))?;
    print_history(&store.recent_runs(HISTORY_LIMIT)?);

    Ok(())
}

/// Handles the main update operation
async fn handle_update(config: &Config, config_hash: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = open_storage(Path::new(&config.store.database_path))?;

    match run_recorded_update(config, config_hash, &mut store, &TracingProgress).await {
        Ok(report) => {
            println!("{}", report);
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", e);
            Err(e.into())
        }
    }
}
