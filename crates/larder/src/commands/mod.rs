//! CLI command handlers.

pub mod cap;
pub mod config;
pub mod maintain;
pub mod prune;
pub mod rotate;

use std::path::PathBuf;
use std::time::Duration;

use console::{Style, style};
use larder_config::{LarderConfig, LoadedConfig};
use larder_session::{MaintenanceReport, SessionMaintenance};

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Session store file to operate on.
    pub store_path: PathBuf,
    /// Explicit user config directory, if given.
    pub config_dir: Option<PathBuf>,
    /// Merged configuration and where it came from.
    pub config: LoadedConfig,
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
}

impl Context {
    /// Maintenance resolving its defaults through the loaded config.
    pub fn maintenance(&self) -> SessionMaintenance<LarderConfig> {
        SessionMaintenance::with_config(self.config.config.clone())
    }
}

/// Convert a `--max-age-days` flag to a duration.
pub fn days(n: u64) -> Duration {
    Duration::from_secs(n.saturating_mul(24 * 60 * 60))
}

/// Print a maintenance report in human-readable form.
pub fn print_report(title: &str, ctx: &Context, report: &MaintenanceReport, dry_run: bool) {
    let dim = Style::new().dim();
    let green = Style::new().green();
    let yellow = Style::new().yellow();

    println!();
    println!("{}", style(title).bold());
    println!("{}", dim.apply_to("─".repeat(40)));
    println!("  {} {}", dim.apply_to("Store:"), ctx.store_path.display());
    if dry_run {
        println!("  {} {}", dim.apply_to("Mode:"), yellow.apply_to("dry run"));
    }
    println!("  {} {}", dim.apply_to("Pruned:"), report.pruned);
    println!("  {} {}", dim.apply_to("Evicted:"), report.evicted);
    println!("  {} {}", dim.apply_to("Remaining:"), report.remaining);
    let rotated = if report.rotated {
        green.apply_to("yes")
    } else {
        dim.apply_to("no")
    };
    println!("  {} {}", dim.apply_to("Rotated:"), rotated);
    println!();
}
