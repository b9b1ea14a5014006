//! Command handlers.
//!
//! Handlers follow one pattern:
//! - Signature: `pub async fn execute(ctx: &CliContext, ...) -> Result<()>`
//! - Dispatch to the controller, await the background task, print the
//!   resulting snapshot
//!
//! Handlers hold no gateway state of their own.

pub mod lifecycle;
pub mod paths;
pub mod service;
pub mod settings;
pub mod status;
pub mod update;
pub mod watch;

use anyhow::Result;

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::presentation::format_snapshot;

/// Print the current snapshot; a recorded failure becomes the command's error.
pub(crate) fn finish(ctx: &CliContext) -> Result<()> {
    let snapshot = ctx.controller().snapshot();
    print!("{}", format_snapshot(&snapshot));
    match snapshot.last_error {
        Some(message) => Err(CliError::Gateway(message).into()),
        None => Ok(()),
    }
}
