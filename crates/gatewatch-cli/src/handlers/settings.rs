//! `mode` and `entry`: persisted preferences.

use std::path::{Path, PathBuf};

use anyhow::Result;
use gatewatch_core::ports::PathResolver;

use crate::bootstrap::CliContext;
use crate::commands::ModeArg;
use crate::error::CliError;

pub async fn mode(ctx: &CliContext, mode: Option<ModeArg>) -> Result<()> {
    if let Some(mode) = mode {
        ctx.controller().set_launch_mode(mode.into()).await?;
    }
    println!("Launch mode: {}", ctx.controller().settings().await.launch_mode);
    last_error(ctx)
}

pub async fn entry(ctx: &CliContext, path: Option<PathBuf>, clear: bool) -> Result<()> {
    let controller = ctx.controller();

    if clear {
        controller.set_entry_override(None).await?;
        println!("Entry override cleared");
    } else if let Some(path) = path {
        let dir = std::path::absolute(&path).map_err(CliError::from)?;
        controller.set_entry_override(Some(dir)).await?;
    }

    match controller.settings().await.entry_override {
        Some(dir) => print_override(ctx, &dir),
        None => println!("Entry override: (none)"),
    }
    let artifact = controller.snapshot().paths.entry_artifact;
    match artifact {
        Some(artifact) => println!("Entry artifact: {}", artifact.display()),
        None => println!("Entry artifact: (not found)"),
    }
    last_error(ctx)
}

fn print_override(ctx: &CliContext, dir: &Path) {
    let verdict = if ctx.resolver.validate_override(dir) {
        "valid"
    } else {
        "missing dist/index.js"
    };
    println!("Entry override: {} ({verdict})", dir.display());
}

fn last_error(ctx: &CliContext) -> Result<()> {
    match ctx.controller().snapshot().last_error {
        Some(message) => Err(CliError::Config(message).into()),
        None => Ok(()),
    }
}
