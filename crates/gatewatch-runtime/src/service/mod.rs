//! Managed-service mode: a per-user launchd agent that keeps the gateway
//! alive across logins.

mod descriptor;
mod launchd;

use gatewatch_core::{BackendError, CommandError, MissingPath};
use thiserror::Error;

pub use descriptor::{SERVICE_BASE_PATH, ServiceDescriptor};
pub use launchd::{LaunchdServiceManager, ServiceConfig};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    MissingPath(#[from] MissingPath),

    #[error("Failed to encode service descriptor: {0}")]
    Descriptor(#[from] plist::Error),

    #[error("Descriptor I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Command(#[from] CommandError),

    /// launchctl ran but refused the request.
    #[error("launchctl {action} failed: {detail}")]
    Launchctl { action: &'static str, detail: String },
}

impl From<ServiceError> for BackendError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::MissingPath(missing) => Self::MissingPath(missing),
            ServiceError::Io(e) => Self::Io(e.to_string()),
            other => Self::ServiceDomain(other.to_string()),
        }
    }
}
