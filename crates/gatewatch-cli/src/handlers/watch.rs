//! `watch`: background polling until Ctrl-C, one line per published change.
//!
//! With `--start` the watcher launches the gateway itself. In direct mode it
//! then holds the child, so an exit nobody asked for shows up as a notice.

use anyhow::Result;
use tracing::info;

use crate::bootstrap::CliContext;
use crate::presentation::format_status_line;

pub async fn execute(ctx: &CliContext, start: bool) -> Result<()> {
    let controller = ctx.controller();
    let mut updates = controller.subscribe();
    controller.resolve_paths().await;

    if start {
        if controller.refresh_now().await.is_running() {
            info!("Gateway already running, watching only");
        } else {
            // Progress arrives through the published snapshots.
            drop(controller.start());
        }
    }
    let background = controller.spawn_background(ctx.shutdown.clone());

    info!(port = ctx.config().port, "Watching gateway");
    let mut last_line = String::new();
    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let line = format_status_line(&updates.borrow_and_update());
                // Timestamps alone do not count as a change.
                if strip_time(&line) != strip_time(&last_line) {
                    println!("{line}");
                }
                last_line = line;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping watch");
                break;
            }
        }
    }

    ctx.shutdown.cancel();
    background.await?;
    Ok(())
}

fn strip_time(line: &str) -> &str {
    line.split_once("] ").map_or(line, |(_, rest)| rest)
}

#[cfg(test)]
mod tests {
    use super::strip_time;

    #[test]
    fn strip_time_drops_bracketed_prefix() {
        assert_eq!(strip_time("[12:00:01] stopped (direct)"), "stopped (direct)");
        assert_eq!(strip_time("no prefix"), "no prefix");
    }
}
