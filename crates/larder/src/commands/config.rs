//! Config command - configuration management.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;

use larder_config::{LarderConfig, MaintenanceConfig, StoreConfig};
use larder_session::{BACKUP_RETENTION, MaintenanceSettings};

use super::Context;

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the resolved maintenance settings
    Show,

    /// Show which config files are loaded and their precedence
    Which,

    /// Initialize a config file with the default thresholds
    Init {
        /// Create project-local config (./larder.toml) instead of user config
        #[arg(long)]
        local: bool,
    },
}

/// Resolved settings for JSON output.
#[derive(Debug, Serialize)]
struct ShowOutput {
    store: String,
    max_age_ms: i64,
    max_entries: usize,
    max_bytes: u64,
    backup_retention: usize,
    loaded_from: Vec<String>,
    warnings: Vec<String>,
}

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => cmd_show(ctx),
        ConfigCommand::Which => cmd_which(ctx),
        ConfigCommand::Init { local } => cmd_init(local, ctx),
    }
}

fn cmd_show(ctx: &Context) -> Result<()> {
    let settings = ctx.maintenance().settings();
    let loaded_from: Vec<String> = ctx
        .config
        .loaded_from()
        .iter()
        .map(|p| p.display().to_string())
        .collect();

    if ctx.json_output {
        let output = ShowOutput {
            store: ctx.store_path.display().to_string(),
            max_age_ms: settings.max_age_ms(),
            max_entries: settings.max_entries,
            max_bytes: settings.max_bytes,
            backup_retention: BACKUP_RETENTION,
            loaded_from,
            warnings: ctx.config.warnings.clone(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("# Larder Configuration\n");
    if loaded_from.is_empty() {
        println!("No config files loaded (using defaults)\n");
    } else {
        println!("Loaded from:");
        for path in &loaded_from {
            println!("  {}", path);
        }
        println!();
    }

    println!("store        = {}", ctx.store_path.display());
    println!(
        "max_age      = {} ms ({} days)",
        settings.max_age_ms(),
        settings.max_age.as_secs() / 86_400
    );
    println!("max_entries  = {}", settings.max_entries);
    println!("max_bytes    = {}", settings.max_bytes);
    println!("backups kept = {}", BACKUP_RETENTION);

    for warning in &ctx.config.warnings {
        println!("\nwarning: {}", warning);
    }

    Ok(())
}

fn cmd_which(ctx: &Context) -> Result<()> {
    println!("Config file search order (later overrides earlier):\n");

    for source in &ctx.config.sources {
        let status = if source.loaded {
            "✓ loaded"
        } else {
            "· not found"
        };
        println!("  {} {}", status, source.path.display());
    }

    println!();
    let loaded_count = ctx.config.loaded_from().len();
    if loaded_count == 0 {
        println!("No config files found. Run 'larder config init' to create one.");
    } else {
        println!("{} config file(s) loaded.", loaded_count);
    }

    Ok(())
}

fn cmd_init(local: bool, ctx: &Context) -> Result<()> {
    let path = if local {
        PathBuf::from("larder.toml")
    } else {
        let dir = ctx
            .config_dir
            .clone()
            .or_else(larder_config::xdg_config_dir)
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        dir.join("config.toml")
    };

    if path.exists() {
        println!("Config file already exists: {}", path.display());
        return Ok(());
    }

    let defaults = MaintenanceSettings::default();
    let config = LarderConfig {
        maintenance: Some(MaintenanceConfig {
            max_age_ms: Some(defaults.max_age_ms() as u64),
            max_entries: Some(defaults.max_entries),
            max_bytes: Some(defaults.max_bytes),
        }),
        store: Some(StoreConfig {
            path: Some(ctx.store_path.clone()),
        }),
        logging: None,
    };

    larder_config::save_config(&config, &path)?;
    println!("Created config file: {}", path.display());

    Ok(())
}
