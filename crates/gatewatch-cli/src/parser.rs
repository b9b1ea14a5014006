//! Root CLI structure with global options.

use clap::Parser;

use crate::commands::Commands;

/// Supervise the local gateway: status, lifecycle, service registration and
/// in-place updates.
#[derive(Parser)]
#[command(name = "gatewatch")]
#[command(about = "Supervise the local lantern gateway")]
#[command(version)]
pub struct Cli {
    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}
