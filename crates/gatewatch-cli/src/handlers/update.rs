//! `update`: stop, sync source, rebuild, start.

use anyhow::Result;

use super::finish;
use crate::bootstrap::CliContext;

pub async fn execute(ctx: &CliContext) -> Result<()> {
    ctx.controller().refresh_now().await;
    println!("Updating gateway...");
    ctx.controller().update_and_rebuild().await?;
    finish(ctx)
}
