//! The single owner of published gateway state.
//!
//! Every state-changing command runs as a background task and re-enters the
//! refresh cycle, which is serialized behind one mutex. Observers read state
//! through a `watch` channel rather than command return values.

use std::fmt::Display;
use std::path::PathBuf;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, RwLock, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::polling::{PollingConfig, PollingScheduler, RefreshCycle};
use super::transition::{Transition, TransitionTracker};
use super::update::{UpdateConfig, UpdateOrchestrator, UpdateOutcome};
use crate::config::{ENTRY_ARTIFACT_RELATIVE, GatewayConfig};
use crate::domain::{
    GatewaySnapshot, GatewayStatus, LaunchMode, Notification, PollTarget, ProcessExit,
    ResolvedPaths,
};
use crate::ports::{
    CommandRunner, GatewayBackend, HealthCheck, Notifier, PathResolver, ServiceInstaller,
    SessionCounter, SettingsRepository, StatusProbe,
};
use crate::settings::Settings;

/// Infrastructure injected by the composition root.
#[derive(Clone)]
pub struct ControllerDeps {
    pub probe: Arc<dyn StatusProbe>,
    pub health: Arc<dyn HealthCheck>,
    pub sessions: Arc<dyn SessionCounter>,
    pub resolver: Arc<dyn PathResolver>,
    pub direct: Arc<dyn GatewayBackend>,
    pub managed: Arc<dyn GatewayBackend>,
    pub installer: Arc<dyn ServiceInstaller>,
    pub settings: Arc<dyn SettingsRepository>,
    pub runner: Arc<dyn CommandRunner>,
    pub notifier: Arc<dyn Notifier>,
}

#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub port: u16,
    pub polling: PollingConfig,
    pub update: UpdateConfig,
}

impl From<&GatewayConfig> for ControllerConfig {
    fn from(config: &GatewayConfig) -> Self {
        Self {
            port: config.port,
            polling: config.polling,
            update: config.update.clone(),
        }
    }
}

/// Facade the presentation layer talks to.
#[derive(Clone)]
pub struct GatewayController {
    inner: Arc<Inner>,
}

struct Inner {
    port: u16,
    probe: Arc<dyn StatusProbe>,
    health: Arc<dyn HealthCheck>,
    sessions: Arc<dyn SessionCounter>,
    resolver: Arc<dyn PathResolver>,
    direct: Arc<dyn GatewayBackend>,
    managed: Arc<dyn GatewayBackend>,
    installer: Arc<dyn ServiceInstaller>,
    settings_repo: Arc<dyn SettingsRepository>,
    notifier: Arc<dyn Notifier>,
    settings: RwLock<Settings>,
    /// Serialization point for refresh cycles.
    tracker: Mutex<TransitionTracker>,
    paths: StdMutex<Option<ResolvedPaths>>,
    snapshot: watch::Sender<GatewaySnapshot>,
    scheduler: PollingScheduler,
    updater: UpdateOrchestrator,
}

impl GatewayController {
    pub fn new(deps: ControllerDeps, config: ControllerConfig, settings: Settings) -> Self {
        let updater = UpdateOrchestrator::new(
            config.update,
            deps.runner,
            Arc::clone(&deps.probe),
            Arc::clone(&deps.resolver),
            Arc::clone(&deps.notifier),
        );

        let initial = GatewaySnapshot {
            launch_mode: settings.launch_mode,
            ..GatewaySnapshot::default()
        };
        let (snapshot, _) = watch::channel(initial);

        Self {
            inner: Arc::new(Inner {
                port: config.port,
                probe: deps.probe,
                health: deps.health,
                sessions: deps.sessions,
                resolver: deps.resolver,
                direct: deps.direct,
                managed: deps.managed,
                installer: deps.installer,
                settings_repo: deps.settings,
                notifier: deps.notifier,
                settings: RwLock::new(settings),
                tracker: Mutex::new(TransitionTracker::new()),
                paths: StdMutex::new(None),
                snapshot,
                scheduler: PollingScheduler::new(config.polling),
                updater,
            }),
        }
    }

    /// Receive every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<GatewaySnapshot> {
        self.inner.snapshot.subscribe()
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> GatewaySnapshot {
        self.inner.snapshot.borrow().clone()
    }

    pub async fn settings(&self) -> Settings {
        self.inner.settings.read().await.clone()
    }

    /// Start the 30-second background refresh.
    pub fn spawn_background(&self, shutdown: CancellationToken) -> JoinHandle<()> {
        let cycle: Arc<dyn RefreshCycle> = self.inner.clone();
        self.inner.scheduler.spawn_background(cycle, shutdown)
    }

    /// Consume exit reports from the direct supervisor.
    pub fn spawn_exit_listener(
        &self,
        mut exits: mpsc::UnboundedReceiver<ProcessExit>,
    ) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            while let Some(exit) = exits.recv().await {
                inner.handle_exit(exit).await;
            }
        })
    }

    /// Run one refresh cycle inline.
    pub async fn refresh_now(&self) -> GatewayStatus {
        self.inner.refresh().await
    }

    /// Resolve (or reuse) runtime and artifact paths and publish them.
    pub async fn resolve_paths(&self) -> ResolvedPaths {
        self.inner.resolved_paths().await
    }

    pub fn start(&self) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.start().await })
    }

    pub fn stop(&self) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.stop().await })
    }

    pub fn restart(&self) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.restart().await })
    }

    pub fn refresh(&self) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            inner.refresh().await;
        })
    }

    pub fn install_service(&self) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.install_service().await })
    }

    pub fn uninstall_service(&self) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.uninstall_service().await })
    }

    pub fn set_launch_mode(&self, mode: LaunchMode) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.set_launch_mode(mode).await })
    }

    /// Set or clear the checkout directory used ahead of other artifact lookups.
    pub fn set_entry_override(&self, dir: Option<PathBuf>) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.set_entry_override(dir).await })
    }

    pub fn update_and_rebuild(&self) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.update_and_rebuild().await })
    }
}

#[async_trait]
impl RefreshCycle for Inner {
    async fn refresh(&self) -> GatewayStatus {
        let mut tracker = self.tracker.lock().await;

        let status = self.probe.probe().await;
        let installed = self.installer.is_installed();
        let (session_count, connected) = if status.is_running() {
            (self.sessions.count().await, self.health.check().await)
        } else {
            (0, false)
        };

        if let Some(transition) = tracker.observe(status) {
            self.announce(transition);
        }

        let settings = self.settings.read().await.clone();
        let override_valid = settings
            .entry_override
            .as_deref()
            .map(|dir| self.resolver.validate_override(dir));
        let updating = self.updater.is_busy();

        self.snapshot.send_modify(|s| {
            s.status = status;
            s.installed = installed;
            s.session_count = session_count;
            s.connected = connected;
            s.launch_mode = settings.launch_mode;
            s.updating = updating;
            s.override_valid = override_valid;
            s.refreshed_at = Some(Utc::now());
        });

        status
    }
}

impl Inner {
    fn announce(&self, transition: Transition) {
        let notification = match transition {
            Transition::Started { pid } => {
                info!(pid, port = self.port, "Gateway started");
                Notification::info(
                    "Gateway started",
                    format!("Listening on port {} (pid {pid})", self.port),
                )
            }
            Transition::Stopped => {
                info!(port = self.port, "Gateway stopped");
                Notification::info("Gateway stopped", format!("Port {} is free", self.port))
            }
        };
        self.notifier.notify(notification);
    }

    async fn handle_exit(&self, exit: ProcessExit) {
        if !exit.requested {
            warn!(pid = exit.pid, code = ?exit.code, "Gateway exited unexpectedly");
            let announce = self.tracker.lock().await.note_unexpected_exit(exit.pid);
            if announce {
                let body = exit.code.map_or_else(
                    || format!("Process {} was terminated", exit.pid),
                    |code| format!("Process {} exited with status {code}", exit.pid),
                );
                self.notifier
                    .notify(Notification::warning("Gateway stopped unexpectedly", body));
            } else {
                debug!(pid = exit.pid, "Stop already announced");
            }
        }
        self.refresh().await;
    }

    fn report_failure(&self, title: &str, err: impl Display) {
        let message = err.to_string();
        error!(error = %message, "{title}");
        self.notifier
            .notify(Notification::error(title, message.clone()));
        self.snapshot
            .send_modify(|s| s.last_error = Some(message));
    }

    fn clear_error(&self) {
        self.snapshot.send_if_modified(|s| s.last_error.take().is_some());
    }

    async fn backend(&self) -> Arc<dyn GatewayBackend> {
        match self.settings.read().await.launch_mode {
            LaunchMode::Direct => Arc::clone(&self.direct),
            LaunchMode::ManagedService => Arc::clone(&self.managed),
        }
    }

    async fn resolved_paths(&self) -> ResolvedPaths {
        let cached = self
            .paths
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(paths) = cached.filter(ResolvedPaths::is_complete) {
            return paths;
        }

        let override_dir = self.settings.read().await.entry_override.clone();
        let resolver = Arc::clone(&self.resolver);
        let paths = tokio::task::spawn_blocking(move || {
            ResolvedPaths::new(
                resolver.resolve_runtime(),
                resolver.resolve_entry_artifact(override_dir.as_deref()),
            )
        })
        .await
        .unwrap_or_default();

        debug!(?paths, "Resolved gateway paths");
        *self.paths.lock().unwrap_or_else(PoisonError::into_inner) = Some(paths.clone());
        self.snapshot.send_modify(|s| s.paths = paths.clone());
        paths
    }

    fn invalidate_paths(&self) {
        *self.paths.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Arm an adaptive session and wait for it to end.
    async fn converge(self: &Arc<Self>, target: PollTarget) {
        let cycle: Arc<dyn RefreshCycle> = Arc::clone(self) as Arc<dyn RefreshCycle>;
        match self.scheduler.arm(cycle, target).await {
            Ok(outcome) => debug!(?target, ?outcome, "Converge finished"),
            Err(e) => warn!(error = %e, "Poll session task failed"),
        }
    }

    async fn start(self: Arc<Self>) {
        let paths = self.resolved_paths().await;
        if let Err(missing) = paths.require() {
            self.report_failure("Cannot start gateway", missing);
            self.refresh().await;
            return;
        }

        let backend = self.backend().await;
        info!(mode = %backend.mode(), "Starting gateway");
        if let Err(e) = backend.start(&paths).await {
            self.report_failure("Failed to start gateway", e);
            self.refresh().await;
            return;
        }

        self.clear_error();
        self.converge(PollTarget::Running).await;
    }

    async fn stop(self: Arc<Self>) {
        let known_pid = self.probe.probe().await.pid();
        let backend = self.backend().await;
        info!(mode = %backend.mode(), ?known_pid, "Stopping gateway");

        if let Err(e) = backend.stop(known_pid).await {
            self.report_failure("Failed to stop gateway", e);
            self.refresh().await;
            return;
        }

        self.clear_error();
        self.converge(PollTarget::Stopped).await;
    }

    async fn restart(self: Arc<Self>) {
        let paths = self.resolved_paths().await;
        if let Err(missing) = paths.require() {
            self.report_failure("Cannot restart gateway", missing);
            self.refresh().await;
            return;
        }

        let known_pid = self.probe.probe().await.pid();
        let backend = self.backend().await;
        info!(mode = %backend.mode(), ?known_pid, "Restarting gateway");

        if let Err(e) = backend.restart(&paths, known_pid).await {
            self.report_failure("Failed to restart gateway", e);
            self.refresh().await;
            return;
        }

        self.clear_error();
        self.converge(PollTarget::Running).await;
    }

    async fn install_service(self: Arc<Self>) {
        let paths = self.resolved_paths().await;
        if let Err(missing) = paths.require() {
            self.report_failure("Cannot install service", missing);
            self.refresh().await;
            return;
        }

        info!("Installing gateway service");
        if let Err(e) = self.installer.install(&paths).await {
            self.report_failure("Failed to install service", e);
            self.refresh().await;
            return;
        }

        self.clear_error();
        self.converge(PollTarget::Running).await;
    }

    async fn uninstall_service(self: Arc<Self>) {
        info!("Uninstalling gateway service");
        if let Err(e) = self.installer.uninstall().await {
            self.report_failure("Failed to uninstall service", e);
            self.refresh().await;
            return;
        }

        self.clear_error();
        if self.settings.read().await.launch_mode == LaunchMode::ManagedService {
            self.converge(PollTarget::Stopped).await;
        } else {
            self.refresh().await;
        }
    }

    async fn set_launch_mode(self: Arc<Self>, mode: LaunchMode) {
        let current = self.settings.read().await.launch_mode;
        if current == LaunchMode::Direct && mode != LaunchMode::Direct {
            // A directly owned child must not outlive direct mode.
            if let Err(e) = self.direct.stop(None).await {
                self.report_failure("Cannot leave direct mode", e);
                self.refresh().await;
                return;
            }
        }

        let updated = {
            let mut settings = self.settings.write().await;
            settings.launch_mode = mode;
            settings.clone()
        };

        info!(%mode, "Launch mode changed");
        if let Err(e) = self.settings_repo.save(&updated).await {
            self.report_failure("Failed to save settings", e);
        }
        self.refresh().await;
    }

    async fn set_entry_override(self: Arc<Self>, dir: Option<PathBuf>) {
        let updated = {
            let mut settings = self.settings.write().await;
            settings.entry_override.clone_from(&dir);
            settings.clone()
        };
        self.invalidate_paths();

        if let Some(dir) = &dir {
            if self.resolver.validate_override(dir) {
                info!(dir = %dir.display(), "Entry override accepted");
            } else {
                warn!(dir = %dir.display(), "Entry override does not contain the artifact");
                self.notifier.notify(Notification::warning(
                    "Entry override not usable",
                    format!("{} does not contain {ENTRY_ARTIFACT_RELATIVE}", dir.display()),
                ));
            }
        }

        if let Err(e) = self.settings_repo.save(&updated).await {
            self.report_failure("Failed to save settings", e);
        }
        self.resolved_paths().await;
        self.refresh().await;
    }

    async fn update_and_rebuild(self: Arc<Self>) {
        if self.updater.is_busy() {
            debug!("Update already running, ignoring request");
            return;
        }

        self.snapshot.send_modify(|s| s.updating = true);
        let paths = self.resolved_paths().await;
        let backend = self.backend().await;

        match self.updater.run(backend.as_ref(), &paths).await {
            UpdateOutcome::Completed => {
                self.clear_error();
                self.converge(PollTarget::Running).await;
            }
            UpdateOutcome::Busy => {}
            UpdateOutcome::Failed(e) => {
                // The orchestrator already notified.
                self.snapshot
                    .send_modify(|s| s.last_error = Some(e.to_string()));
                self.refresh().await;
            }
        }
    }
}
