//! The two launch strategies behind the `GatewayBackend` port.

use std::sync::Arc;

use async_trait::async_trait;
use gatewatch_core::ports::GatewayBackend;
use gatewatch_core::{BackendError, LaunchMode, ResolvedPaths};
use tracing::{debug, info};

use crate::process::ProcessSupervisor;
use crate::service::LaunchdServiceManager;

/// Direct mode: this process spawns and owns the gateway.
pub struct DirectBackend {
    supervisor: Arc<ProcessSupervisor>,
}

impl DirectBackend {
    pub const fn new(supervisor: Arc<ProcessSupervisor>) -> Self {
        Self { supervisor }
    }
}

#[async_trait]
impl GatewayBackend for DirectBackend {
    fn mode(&self) -> LaunchMode {
        LaunchMode::Direct
    }

    async fn start(&self, paths: &ResolvedPaths) -> Result<(), BackendError> {
        let pid = self.supervisor.spawn(paths)?;
        debug!(pid, "Direct start dispatched");
        Ok(())
    }

    async fn stop(&self, known_pid: Option<u32>) -> Result<(), BackendError> {
        self.supervisor.terminate(true, known_pid).await
    }

    async fn restart(
        &self,
        paths: &ResolvedPaths,
        known_pid: Option<u32>,
    ) -> Result<(), BackendError> {
        self.stop(known_pid).await?;
        self.start(paths).await
    }

    fn is_installed(&self) -> bool {
        false
    }
}

/// Managed-service mode: launchd runs the gateway.
///
/// Start and restart both end in a forced kickstart; stop unloads the agent
/// but keeps its descriptor.
pub struct ManagedServiceBackend {
    manager: Arc<LaunchdServiceManager>,
}

impl ManagedServiceBackend {
    pub const fn new(manager: Arc<LaunchdServiceManager>) -> Self {
        Self { manager }
    }

    async fn ensure_running(&self, paths: &ResolvedPaths) -> Result<(), BackendError> {
        if !self.manager.is_installed() {
            info!("Service not installed, installing before start");
            return Ok(self.manager.install(paths).await?);
        }

        // A stopped agent is unloaded; an already loaded one rejects this.
        if let Err(e) = self.manager.load().await {
            debug!(error = %e, "Load before kickstart failed");
        }
        Ok(self.manager.kickstart(true).await?)
    }
}

#[async_trait]
impl GatewayBackend for ManagedServiceBackend {
    fn mode(&self) -> LaunchMode {
        LaunchMode::ManagedService
    }

    async fn start(&self, paths: &ResolvedPaths) -> Result<(), BackendError> {
        self.ensure_running(paths).await
    }

    async fn stop(&self, _known_pid: Option<u32>) -> Result<(), BackendError> {
        Ok(self.manager.stop().await?)
    }

    async fn restart(
        &self,
        paths: &ResolvedPaths,
        _known_pid: Option<u32>,
    ) -> Result<(), BackendError> {
        self.ensure_running(paths).await
    }

    fn is_installed(&self) -> bool {
        self.manager.is_installed()
    }
}
