//! Core of the gateway supervisor.
//!
//! Domain types, port traits and the services that reconcile what the
//! supervisor believes about the gateway with what the well-known port says.
//! Nothing here touches processes, signals or the filesystem directly; the
//! runtime crate provides the adapters.

#![deny(unused_crate_dependencies)]

pub mod config;
pub mod domain;
pub mod ports;
pub mod services;
pub mod settings;

// Re-export commonly used types for convenience
pub use config::{
    ENTRY_ARTIFACT_RELATIVE, GATEWAY_CLI_NAME, GATEWAY_PORT, GatewayConfig, MAINLINE_BRANCH,
    PathError, RUNTIME_NAME, SERVICE_LABEL,
};
pub use domain::{
    GatewayInvocation, GatewaySnapshot, GatewayStatus, LaunchMode, MissingPath, Notification,
    NotificationLevel, PollTarget, ProcessExit, ResolvedPaths,
};
pub use ports::{BackendError, CommandError, RepositoryError};
pub use services::{ControllerConfig, ControllerDeps, GatewayController};
pub use settings::Settings;
