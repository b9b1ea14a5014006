//! Pure domain types shared by services and adapters.

mod launch;
mod snapshot;
mod status;

pub use launch::{
    GATEWAY_SUBCOMMAND, GatewayInvocation, LaunchMode, MissingPath, ResolvedPaths, is_script,
    working_dir_for,
};
pub use snapshot::{GatewaySnapshot, Notification, NotificationLevel, ProcessExit};
pub use status::{GatewayStatus, PollTarget};
