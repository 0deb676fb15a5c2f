//! Rotate command - move an oversized store file to a backup.

use anyhow::Result;
use clap::Args;
use console::Style;
use serde::Serialize;

use super::Context;

/// Arguments for the rotate command.
#[derive(Args, Debug)]
pub struct RotateArgs {
    /// Rotate when the store file is larger than this many bytes
    #[arg(long)]
    pub max_bytes: Option<u64>,
}

#[derive(Debug, Serialize)]
struct RotateOutput {
    store: String,
    rotated: bool,
    backups: Vec<String>,
}

/// Run the rotate command.
pub async fn run(args: RotateArgs, ctx: &Context) -> Result<()> {
    let maintenance = ctx.maintenance();

    let rotated = maintenance
        .rotate_session_file(&ctx.store_path, args.max_bytes)
        .await?;
    let backups: Vec<String> = larder_session::list_backups(&ctx.store_path)
        .await?
        .iter()
        .map(|p| p.display().to_string())
        .collect();

    if ctx.json_output {
        let output = RotateOutput {
            store: ctx.store_path.display().to_string(),
            rotated,
            backups,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let dim = Style::new().dim();
    let green = Style::new().green();
    if rotated {
        println!("{} {}", green.apply_to("Rotated"), ctx.store_path.display());
    } else {
        println!(
            "{} {}",
            dim.apply_to("Under threshold, not rotated:"),
            ctx.store_path.display()
        );
    }
    if ctx.verbose || rotated {
        for backup in &backups {
            println!("  {}", dim.apply_to(backup));
        }
    }

    Ok(())
}
