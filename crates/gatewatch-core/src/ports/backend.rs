//! Lifecycle backend ports.
//!
//! The two launch strategies share one capability set so the controller
//! never branches on [`LaunchMode`] at call sites.

use async_trait::async_trait;

use super::BackendError;
use crate::domain::{LaunchMode, ResolvedPaths};

/// Start/stop/restart capability shared by both launch strategies.
#[async_trait]
pub trait GatewayBackend: Send + Sync {
    /// The launch mode this backend implements.
    fn mode(&self) -> LaunchMode;

    /// Start the gateway. Requires both paths.
    async fn start(&self, paths: &ResolvedPaths) -> Result<(), BackendError>;

    /// Stop the gateway.
    ///
    /// `known_pid` is the port holder found by the last probe; backends that
    /// do not own a live handle fall back to signaling it. With `None` the
    /// direct backend only stops a child it owns.
    async fn stop(&self, known_pid: Option<u32>) -> Result<(), BackendError>;

    /// Restart the gateway.
    async fn restart(
        &self,
        paths: &ResolvedPaths,
        known_pid: Option<u32>,
    ) -> Result<(), BackendError>;

    /// Whether a persistent registration exists for this backend.
    fn is_installed(&self) -> bool;
}

/// Persistent service registration (install/uninstall), independent of mode.
#[async_trait]
pub trait ServiceInstaller: Send + Sync {
    /// Existence of the service descriptor file.
    fn is_installed(&self) -> bool;

    /// Write the descriptor, load it and force a start.
    ///
    /// A descriptor that was written but failed to load is an error.
    async fn install(&self, paths: &ResolvedPaths) -> Result<(), BackendError>;

    /// Best-effort unload, then delete the descriptor.
    async fn uninstall(&self) -> Result<(), BackendError>;
}
