//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces that the core services expect from
//! infrastructure. They contain no implementation details and use only
//! domain types.
//!
//! # Design Rules
//!
//! - No process, signal or filesystem details in any signature
//! - Leaf probes are infallible: failures normalize to a safe value
//! - Commands that can fail return a domain error enum

pub mod backend;
pub mod command_runner;
pub mod notifier;
pub mod path_resolver;
pub mod probe;
pub mod settings_repository;

use thiserror::Error;

use crate::domain::MissingPath;

pub use backend::{GatewayBackend, ServiceInstaller};
pub use command_runner::{CommandOutput, CommandRunner, CommandSpec};
pub use notifier::Notifier;
pub use path_resolver::PathResolver;
pub use probe::{HealthCheck, SessionCounter, StatusProbe};
pub use settings_repository::SettingsRepository;

#[cfg(test)]
pub use settings_repository::MockSettingsRepository;

/// Errors from starting, stopping or registering the gateway.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Runtime or entry artifact could not be resolved.
    #[error(transparent)]
    MissingPath(#[from] MissingPath),

    /// The gateway process could not be spawned.
    #[error("Failed to spawn gateway: {0}")]
    Spawn(String),

    /// Signal delivery failed.
    #[error("Failed to signal gateway: {0}")]
    Signal(String),

    /// The OS service domain rejected a request.
    #[error("Service manager error: {0}")]
    ServiceDomain(String),

    /// Descriptor or log file I/O failed.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Errors from running an external tool.
#[derive(Debug, Clone, Error)]
pub enum CommandError {
    /// The tool could not be executed at all.
    #[error("Failed to execute {program}: {reason}")]
    Spawn { program: String, reason: String },
}

/// Domain-specific errors for repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Storage backend error (filesystem).
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}
