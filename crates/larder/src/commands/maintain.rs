//! Maintain command - full prune, cap, rotate, save pass.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use larder_config::MaintenanceConfig;
use larder_session::MaintenanceReport;

use super::{Context, days, print_report};

/// Arguments for the maintain command.
#[derive(Args, Debug)]
pub struct MaintainArgs {
    /// Prune sessions idle longer than this many days
    #[arg(long)]
    pub max_age_days: Option<u64>,

    /// Keep at most this many sessions
    #[arg(long)]
    pub max_entries: Option<usize>,

    /// Rotate the store file when larger than this many bytes
    #[arg(long)]
    pub max_bytes: Option<u64>,

    /// Report what would change without touching the store
    #[arg(long)]
    pub dry_run: bool,
}

/// Maintenance result for JSON output.
#[derive(Debug, Serialize)]
struct MaintainOutput<'a> {
    store: String,
    dry_run: bool,
    #[serde(flatten)]
    report: &'a MaintenanceReport,
}

/// Run the maintain command.
pub async fn run(args: MaintainArgs, ctx: &Context) -> Result<()> {
    let overrides = MaintenanceConfig {
        max_age_ms: args
            .max_age_days
            .map(|n| u64::try_from(days(n).as_millis()).unwrap_or(u64::MAX)),
        max_entries: args.max_entries,
        max_bytes: args.max_bytes,
    };

    let report = ctx
        .maintenance()
        .run(&ctx.store_path, &overrides, args.dry_run)
        .await?;

    if ctx.json_output {
        let output = MaintainOutput {
            store: ctx.store_path.display().to_string(),
            dry_run: args.dry_run,
            report: &report,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_report("Session Store Maintenance", ctx, &report, args.dry_run);
    }

    Ok(())
}
