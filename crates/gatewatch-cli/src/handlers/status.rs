//! `status`: one probe, printed.

use anyhow::Result;

use crate::bootstrap::CliContext;
use crate::presentation::format_snapshot;

pub async fn execute(ctx: &CliContext, json: bool) -> Result<()> {
    ctx.controller().resolve_paths().await;
    ctx.controller().refresh_now().await;
    let snapshot = ctx.controller().snapshot();

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print!("{}", format_snapshot(&snapshot));
    }
    Ok(())
}
