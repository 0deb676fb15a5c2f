//! Prune command - remove stale sessions.

use anyhow::Result;
use clap::Args;
use console::Style;
use serde::Serialize;

use super::{Context, days};

/// Arguments for the prune command.
#[derive(Args, Debug)]
pub struct PruneArgs {
    /// Prune sessions idle longer than this many days
    #[arg(long)]
    pub max_age_days: Option<u64>,
}

#[derive(Debug, Serialize)]
struct PruneOutput {
    store: String,
    pruned: usize,
    remaining: usize,
}

/// Run the prune command.
pub async fn run(args: PruneArgs, ctx: &Context) -> Result<()> {
    let maintenance = ctx.maintenance();
    let mut store = larder_session::load_store(&ctx.store_path).await?;

    let pruned = maintenance.prune_stale_entries(&mut store, args.max_age_days.map(days));
    if pruned > 0 {
        larder_session::save_store(&ctx.store_path, &store).await?;
    }

    if ctx.json_output {
        let output = PruneOutput {
            store: ctx.store_path.display().to_string(),
            pruned,
            remaining: store.len(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        let dim = Style::new().dim();
        println!(
            "Pruned {} stale session(s), {} remaining {}",
            pruned,
            store.len(),
            dim.apply_to(ctx.store_path.display())
        );
    }

    Ok(())
}
