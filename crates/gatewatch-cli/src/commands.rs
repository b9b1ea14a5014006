//! Subcommands of the `gatewatch` CLI.

use std::path::PathBuf;

use clap::{Subcommand, ValueEnum};
use gatewatch_core::LaunchMode;

#[derive(Subcommand)]
pub enum Commands {
    /// Probe the gateway and print its status
    Status {
        /// Print the snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// Start the gateway with the configured launch mode
    ///
    /// A directly spawned gateway keeps running after this command returns.
    Start,

    /// Stop the gateway
    Stop,

    /// Restart the gateway
    Restart,

    /// Re-probe status, installation and session details
    Refresh,

    /// Register the gateway as a per-user launchd service and start it
    InstallService,

    /// Unload the launchd service and remove its descriptor
    UninstallService,

    /// Show or change the launch mode
    Mode {
        /// New launch mode
        #[arg(value_enum)]
        mode: Option<ModeArg>,
    },

    /// Show, set or clear the gateway checkout override
    Entry {
        /// Checkout directory containing dist/index.js
        #[arg(conflicts_with = "clear")]
        path: Option<PathBuf>,

        /// Remove the override
        #[arg(long)]
        clear: bool,
    },

    /// Stop, sync source, rebuild and restart the gateway
    Update,

    /// Keep polling and print every status change until interrupted
    Watch {
        /// Start the gateway first if it is not running; in direct mode the
        /// watcher then owns it and reports when it exits on its own
        #[arg(long)]
        start: bool,
    },

    /// Show resolved runtime, artifact and file locations with search details
    Paths,
}

/// Launch mode as spelled on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Spawn and own the gateway process directly
    Direct,
    /// Run the gateway under launchd
    Managed,
}

impl From<ModeArg> for LaunchMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Direct => Self::Direct,
            ModeArg::Managed => Self::ManagedService,
        }
    }
}
