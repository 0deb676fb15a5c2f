//! Cap command - evict sessions over the entry limit.

use anyhow::Result;
use clap::Args;
use console::Style;
use serde::Serialize;

use super::Context;

/// Arguments for the cap command.
#[derive(Args, Debug)]
pub struct CapArgs {
    /// Keep at most this many sessions
    #[arg(long)]
    pub max_entries: Option<usize>,
}

#[derive(Debug, Serialize)]
struct CapOutput {
    store: String,
    evicted: usize,
    remaining: usize,
}

/// Run the cap command.
pub async fn run(args: CapArgs, ctx: &Context) -> Result<()> {
    let maintenance = ctx.maintenance();
    let mut store = larder_session::load_store(&ctx.store_path).await?;

    let evicted = maintenance.cap_entry_count(&mut store, args.max_entries);
    if evicted > 0 {
        larder_session::save_store(&ctx.store_path, &store).await?;
    }

    if ctx.json_output {
        let output = CapOutput {
            store: ctx.store_path.display().to_string(),
            evicted,
            remaining: store.len(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        let dim = Style::new().dim();
        println!(
            "Evicted {} session(s), {} remaining {}",
            evicted,
            store.len(),
            dim.apply_to(ctx.store_path.display())
        );
    }

    Ok(())
}
