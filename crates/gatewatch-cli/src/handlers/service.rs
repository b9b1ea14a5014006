//! `install-service` and `uninstall-service`.

use anyhow::Result;

use super::finish;
use crate::bootstrap::CliContext;

pub async fn install(ctx: &CliContext) -> Result<()> {
    ctx.controller().refresh_now().await;
    ctx.controller().install_service().await?;
    println!("Descriptor: {}", ctx.config().descriptor_path.display());
    finish(ctx)
}

pub async fn uninstall(ctx: &CliContext) -> Result<()> {
    ctx.controller().refresh_now().await;
    ctx.controller().uninstall_service().await?;
    finish(ctx)
}
