//! `paths`: where everything is, and how it was found.

use anyhow::Result;
use gatewatch_core::domain::working_dir_for;

use crate::bootstrap::CliContext;
use crate::presentation::format_resolution;

pub async fn execute(ctx: &CliContext) -> Result<()> {
    let config = ctx.config();
    let settings = ctx.controller().settings().await;
    let resolver = ctx.resolver.clone();
    let entry_override = settings.entry_override.clone();

    let (runtime, artifact, package_manager) = tokio::task::spawn_blocking(move || {
        (
            resolver.diagnose_runtime(),
            resolver.diagnose_entry_artifact(entry_override.as_deref()),
            resolver.diagnose_package_manager(),
        )
    })
    .await?;

    println!("port = {}", config.port);
    println!("launch_mode = {}", settings.launch_mode);
    println!("settings = {}", config.settings_path.display());
    println!("state_dir = {}", config.state_dir.display());
    println!("log = {}", config.log_path.display());
    println!("sessions = {}", config.sessions_path.display());
    println!("descriptor = {}", config.descriptor_path.display());
    if let Some(dir) = &settings.entry_override {
        println!("entry_override = {}", dir.display());
    }
    if let Some(artifact) = &artifact.resolved {
        println!("working_dir = {}", working_dir_for(artifact).display());
    }
    println!();
    print!("{}", format_resolution("runtime", &runtime));
    print!("{}", format_resolution("entry_artifact", &artifact));
    print!("{}", format_resolution("package_manager", &package_manager));
    Ok(())
}
