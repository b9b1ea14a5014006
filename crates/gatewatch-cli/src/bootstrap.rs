//! CLI bootstrap, the composition root.
//!
//! The only place where concrete adapters are instantiated and wired into
//! the [`GatewayController`]. Handlers receive a [`CliContext`] and never
//! construct infrastructure themselves.

use std::sync::Arc;

use anyhow::{Context, Result};
use gatewatch_core::ports::{CommandRunner, Notifier, SettingsRepository};
use gatewatch_core::{ControllerConfig, ControllerDeps, GatewayConfig, GatewayController};
use gatewatch_runtime::{
    DirectBackend, GatewayPathResolver, HttpHealthCheck, JsonSettingsStore, LaunchdServiceManager,
    LsofStatusProbe, ManagedServiceBackend, ProcessSupervisor, ServiceConfig, SessionFileCounter,
    SupervisorConfig, TokioCommandRunner, TracingNotifier,
};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::CliError;
use crate::presentation::ConsoleNotifier;

/// Where user-facing notices go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoticeSink {
    /// Printed to stderr.
    #[default]
    Console,
    /// Written to the tracing log only.
    Log,
}

/// Bootstrap configuration for the CLI.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub gateway: GatewayConfig,
    pub notices: NoticeSink,
}

impl CliConfig {
    /// Default locations, honouring the `GATEWATCH_*` directory overrides.
    pub fn with_defaults() -> Result<Self, CliError> {
        Ok(Self {
            gateway: GatewayConfig::with_defaults()?,
            notices: NoticeSink::default(),
        })
    }

    #[must_use]
    pub const fn with_notices(mut self, notices: NoticeSink) -> Self {
        self.notices = notices;
        self
    }
}

/// Fully composed context for command handlers.
pub struct CliContext {
    pub controller: GatewayController,
    /// Kept separately for `paths` diagnostics.
    pub resolver: Arc<GatewayPathResolver>,
    pub config: GatewayConfig,
    /// Cancels the background refresh loop.
    pub shutdown: CancellationToken,
}

impl CliContext {
    pub const fn controller(&self) -> &GatewayController {
        &self.controller
    }

    pub const fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

/// Wire probes, resolver, both backends and the settings store into a
/// controller, and start listening for direct-mode exit reports.
pub async fn bootstrap(config: CliConfig) -> Result<CliContext> {
    let gateway = config.gateway;

    let runner: Arc<dyn CommandRunner> = Arc::new(TokioCommandRunner::new());
    let probe = Arc::new(LsofStatusProbe::new(Arc::clone(&runner), gateway.port));
    let health = Arc::new(
        HttpHealthCheck::new(gateway.port).context("Failed to build health-check client")?,
    );
    let sessions = Arc::new(SessionFileCounter::new(gateway.sessions_path.clone()));
    let resolver = Arc::new(GatewayPathResolver::system());

    let (supervisor, exits) =
        ProcessSupervisor::new(SupervisorConfig::new(gateway.port, gateway.log_path.clone()));
    let service = Arc::new(LaunchdServiceManager::new(
        ServiceConfig::new(
            gateway.service_label.clone(),
            gateway.descriptor_path.clone(),
            gateway.log_path.clone(),
            gateway.port,
        ),
        Arc::clone(&runner),
    ));

    let store = Arc::new(JsonSettingsStore::new(gateway.settings_path.clone()));
    let settings = store.load().await.map_err(CliError::from)?;
    debug!(?settings, path = %gateway.settings_path.display(), "Loaded settings");

    let notifier: Arc<dyn Notifier> = match config.notices {
        NoticeSink::Console => Arc::new(ConsoleNotifier),
        NoticeSink::Log => Arc::new(TracingNotifier),
    };

    let deps = ControllerDeps {
        probe,
        health,
        sessions,
        resolver: resolver.clone(),
        direct: Arc::new(DirectBackend::new(Arc::new(supervisor))),
        managed: Arc::new(ManagedServiceBackend::new(Arc::clone(&service))),
        installer: service,
        settings: store,
        runner,
        notifier,
    };

    let controller = GatewayController::new(deps, ControllerConfig::from(&gateway), settings);
    controller.spawn_exit_listener(exits);

    Ok(CliContext {
        controller,
        resolver,
        config: gateway,
        shutdown: CancellationToken::new(),
    })
}
