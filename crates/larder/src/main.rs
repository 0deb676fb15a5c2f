//! Larder - session store maintenance
//!
//! Main entry point for the Larder CLI.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_appender::non_blocking::WorkerGuard;

use larder_config::LoggingConfig;

mod commands;

use commands::{cap, config, maintain, prune, rotate};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Larder - keeps a persisted session store bounded in age, size, and footprint
#[derive(Parser)]
#[command(name = "larder")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Directory holding the user config.toml
    #[arg(long, global = true, env = "LARDER_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,

    /// Session store file (default: [store] path from config)
    #[arg(long, global = true, env = "LARDER_STORE")]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Prune, cap, rotate, and save the session store
    Maintain(maintain::MaintainArgs),

    /// Remove sessions idle longer than the maximum age
    Prune(prune::PruneArgs),

    /// Evict the lowest-priority sessions over the entry cap
    Cap(cap::CapArgs),

    /// Rotate the store file to a backup when it is too large
    Rotate(rotate::RotateArgs),

    /// Configuration management
    Config(config::ConfigArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = larder_config::load_config_with_options(None, cli.config_dir.as_deref())?;

    let logging = loaded.config.logging.clone().unwrap_or_default();
    let _guard = init_tracing(cli.verbose, &logging, cli.config_dir.clone());

    for warning in &loaded.warnings {
        warn!("{}", warning);
    }

    let store_path = cli
        .store
        .clone()
        .unwrap_or_else(|| loaded.config.store_path());

    let ctx = commands::Context {
        store_path,
        config_dir: cli.config_dir.clone(),
        config: loaded,
        json_output: cli.json,
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Maintain(args) => maintain::run(args, &ctx).await,
        Commands::Prune(args) => prune::run(args, &ctx).await,
        Commands::Cap(args) => cap::run(args, &ctx).await,
        Commands::Rotate(args) => rotate::run(args, &ctx).await,
        Commands::Config(args) => config::run(args, &ctx).await,
    }
}

/// Console (human-readable, stderr) plus an optional daily-rotating JSON file.
fn init_tracing(
    verbose: bool,
    logging: &LoggingConfig,
    config_dir: Option<PathBuf>,
) -> Option<WorkerGuard> {
    use tracing_subscriber::prelude::*;

    let filter = if verbose {
        "larder=debug,larder_session=debug,larder_config=debug,info"
    } else {
        "larder=info,larder_session=info,larder_config=info,warn"
    };

    let console = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr)
        .with_filter(tracing_subscriber::EnvFilter::new(filter));

    if !logging.file {
        tracing_subscriber::registry().with(console).init();
        return None;
    }

    let log_dir = logging
        .dir
        .clone()
        .or_else(|| config_dir.map(|d| d.join("logs")))
        .or_else(|| larder_config::xdg_config_dir().map(|d| d.join("logs")))
        .unwrap_or_else(|| PathBuf::from("logs"));
    let file_appender = tracing_appender::rolling::daily(&log_dir, "larder.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(console)
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "larder=trace,larder_session=trace,larder_config=trace,info",
                )),
        )
        .init();

    Some(guard)
}
