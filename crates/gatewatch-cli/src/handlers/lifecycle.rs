//! `start`, `stop`, `restart` and `refresh`.
//!
//! A baseline refresh runs first so the transition the command causes is
//! announced; each command then waits for its adaptive poll to settle.

use anyhow::Result;

use super::finish;
use crate::bootstrap::CliContext;

pub async fn start(ctx: &CliContext) -> Result<()> {
    let controller = ctx.controller();
    if controller.refresh_now().await.is_running() {
        println!("Gateway is already running");
        return finish(ctx);
    }
    controller.start().await?;
    finish(ctx)
}

pub async fn stop(ctx: &CliContext) -> Result<()> {
    ctx.controller().refresh_now().await;
    ctx.controller().stop().await?;
    finish(ctx)
}

pub async fn restart(ctx: &CliContext) -> Result<()> {
    ctx.controller().refresh_now().await;
    ctx.controller().restart().await?;
    finish(ctx)
}

pub async fn refresh(ctx: &CliContext) -> Result<()> {
    ctx.controller().resolve_paths().await;
    ctx.controller().refresh().await?;
    finish(ctx)
}
