//! Stop, sync, build and restart the gateway as one operation.
//!
//! Stages gate each other:
//! 1. stop the running gateway and wait (bounded) for the port to free up
//! 2. pull the mainline branch, or only fetch it on any other branch
//! 3. resolve a package manager and run the build
//! 4. start the gateway again and announce success after a settle delay
//!
//! Source-control failures are logged and skipped. A missing package manager
//! or failed build aborts before the restart. Only one update runs at a time.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::MAINLINE_BRANCH;
use crate::domain::{GatewayStatus, MissingPath, Notification, ResolvedPaths, working_dir_for};
use crate::ports::{
    BackendError, CommandRunner, CommandSpec, GatewayBackend, Notifier, PathResolver,
    StatusProbe,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateConfig {
    pub port_release_interval: Duration,
    pub port_release_attempts: u32,
    pub settle_delay: Duration,
    pub mainline_branch: String,
    pub git: PathBuf,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            port_release_interval: Duration::from_millis(500),
            port_release_attempts: 20,
            settle_delay: Duration::from_secs(2),
            mainline_branch: MAINLINE_BRANCH.to_string(),
            git: PathBuf::from("git"),
        }
    }
}

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error(transparent)]
    MissingPath(#[from] MissingPath),

    #[error("No package manager found (tried pnpm and npm)")]
    NoPackageManager,

    #[error("Build exited with status {code}")]
    BuildFailed { code: i32 },

    #[error("Build could not be run: {0}")]
    BuildNotRun(String),

    #[error("Gateway did not restart: {0}")]
    Restart(#[source] BackendError),
}

#[derive(Debug)]
pub enum UpdateOutcome {
    Completed,
    /// Another update was already running; nothing was done.
    Busy,
    Failed(UpdateError),
}

pub struct UpdateOrchestrator {
    config: UpdateConfig,
    busy: AtomicBool,
    runner: Arc<dyn CommandRunner>,
    probe: Arc<dyn StatusProbe>,
    resolver: Arc<dyn PathResolver>,
    notifier: Arc<dyn Notifier>,
}

/// Clears the busy flag on every exit path.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl UpdateOrchestrator {
    pub fn new(
        config: UpdateConfig,
        runner: Arc<dyn CommandRunner>,
        probe: Arc<dyn StatusProbe>,
        resolver: Arc<dyn PathResolver>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            config,
            busy: AtomicBool::new(false),
            runner,
            probe,
            resolver,
            notifier,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Run the full update through `backend`. A second call while one is
    /// in flight returns [`UpdateOutcome::Busy`] immediately.
    pub async fn run(&self, backend: &dyn GatewayBackend, paths: &ResolvedPaths) -> UpdateOutcome {
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Update already in progress");
            return UpdateOutcome::Busy;
        }
        let _guard = BusyGuard(&self.busy);

        match self.run_stages(backend, paths).await {
            Ok(()) => {
                tokio::time::sleep(self.config.settle_delay).await;
                info!("Gateway update completed");
                self.notifier.notify(Notification::info(
                    "Gateway updated",
                    "Rebuilt and restarted the gateway",
                ));
                UpdateOutcome::Completed
            }
            Err(e) => {
                warn!(error = %e, "Gateway update failed");
                self.notifier
                    .notify(Notification::error("Gateway update failed", e.to_string()));
                UpdateOutcome::Failed(e)
            }
        }
    }

    async fn run_stages(
        &self,
        backend: &dyn GatewayBackend,
        paths: &ResolvedPaths,
    ) -> Result<(), UpdateError> {
        // Both paths must resolve before the gateway is stopped.
        let (_, artifact) = paths.require()?;
        let work_dir = working_dir_for(artifact);

        self.stop_running(backend).await;
        self.sync_source(&work_dir).await;
        self.build(&work_dir).await?;

        info!(mode = %backend.mode(), "Starting gateway after update");
        backend.start(paths).await.map_err(UpdateError::Restart)
    }

    async fn stop_running(&self, backend: &dyn GatewayBackend) {
        let GatewayStatus::Running { pid } = self.probe.probe().await else {
            return;
        };

        info!(pid, "Stopping gateway for update");
        if let Err(e) = backend.stop(Some(pid)).await {
            warn!(error = %e, "Stop before update failed");
        }

        for _ in 0..self.config.port_release_attempts {
            if self.probe.port_available().await {
                debug!("Port released");
                return;
            }
            tokio::time::sleep(self.config.port_release_interval).await;
        }

        warn!(
            attempts = self.config.port_release_attempts,
            "Port still held after stop, continuing with update"
        );
    }

    async fn sync_source(&self, work_dir: &Path) {
        let git = |args: &[&str]| {
            CommandSpec::new(&self.config.git)
                .args(args.iter().copied())
                .current_dir(work_dir)
        };

        let branch = match self
            .runner
            .run(&git(&["rev-parse", "--abbrev-ref", "HEAD"]))
            .await
        {
            Ok(out) if out.success() => out.stdout.trim().to_string(),
            Ok(out) => {
                warn!(stderr = %out.stderr.trim(), "Could not determine branch, skipping sync");
                return;
            }
            Err(e) => {
                warn!(error = %e, "Could not run git, skipping sync");
                return;
            }
        };

        let mainline = self.config.mainline_branch.as_str();
        let spec = if branch == mainline {
            git(&["pull"])
        } else {
            info!(%branch, "Not on {mainline}, fetching without merging");
            git(&["fetch", "origin", mainline])
        };

        match self.runner.run(&spec).await {
            Ok(out) if out.success() => debug!(command = %spec.display(), "Source synced"),
            Ok(out) => warn!(
                command = %spec.display(),
                stderr = %out.stderr.trim(),
                "Source sync failed"
            ),
            Err(e) => warn!(error = %e, "Source sync failed"),
        }
    }

    async fn build(&self, work_dir: &Path) -> Result<(), UpdateError> {
        let resolver = Arc::clone(&self.resolver);
        let package_manager =
            tokio::task::spawn_blocking(move || resolver.resolve_package_manager())
                .await
                .ok()
                .flatten()
                .ok_or(UpdateError::NoPackageManager)?;

        let mut spec = CommandSpec::new(&package_manager)
            .args(["run", "build"])
            .current_dir(work_dir);
        if let Some(dir) = package_manager.parent() {
            let inherited = std::env::var("PATH").unwrap_or_default();
            spec = spec.env("PATH", format!("{}:{inherited}", dir.display()));
        }

        info!(command = %spec.display(), dir = %work_dir.display(), "Building gateway");
        let output = self
            .runner
            .run(&spec)
            .await
            .map_err(|e| UpdateError::BuildNotRun(e.to_string()))?;

        if output.success() {
            Ok(())
        } else {
            Err(UpdateError::BuildFailed {
                code: output.code.unwrap_or(-1),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NotificationLevel;
    use crate::services::test_support::{
        FakeBackend, FakeProbe, FakeResolver, FakeRunner, RecordingNotifier,
    };

    struct Harness {
        probe: Arc<FakeProbe>,
        backend: FakeBackend,
        runner: Arc<FakeRunner>,
        notifier: Arc<RecordingNotifier>,
        orchestrator: UpdateOrchestrator,
    }

    fn harness(runner: FakeRunner, resolver: FakeResolver) -> Harness {
        let probe = Arc::new(FakeProbe::new(GatewayStatus::Running { pid: 77 }));
        let backend = FakeBackend::direct(probe.clone());
        let runner = Arc::new(runner);
        let notifier = Arc::new(RecordingNotifier::default());
        let orchestrator = UpdateOrchestrator::new(
            UpdateConfig::default(),
            runner.clone(),
            probe.clone(),
            Arc::new(resolver),
            notifier.clone(),
        );
        Harness {
            probe,
            backend,
            runner,
            notifier,
            orchestrator,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn failed_build_leaves_gateway_stopped() {
        let h = harness(
            FakeRunner::new().with_exit("/usr/bin/pnpm run build", 1),
            FakeResolver::complete(),
        );

        let outcome = h.orchestrator.run(&h.backend, &FakeResolver::paths()).await;

        assert!(matches!(
            outcome,
            UpdateOutcome::Failed(UpdateError::BuildFailed { code: 1 })
        ));
        assert_eq!(h.backend.calls(), vec!["stop:Some(77)"]);
        assert_eq!(h.probe.current(), GatewayStatus::Stopped);
        let notes = h.notifier.take();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].level, NotificationLevel::Error);
        assert!(!h.orchestrator.is_busy());
    }

    #[tokio::test(start_paused = true)]
    async fn successful_build_restarts_with_one_notice() {
        let h = harness(FakeRunner::new(), FakeResolver::complete());

        let outcome = h.orchestrator.run(&h.backend, &FakeResolver::paths()).await;

        assert!(matches!(outcome, UpdateOutcome::Completed));
        assert_eq!(h.backend.calls(), vec!["stop:Some(77)", "start"]);
        assert!(h.probe.current().is_running());
        let notes = h.notifier.take();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, "Gateway updated");
    }

    #[tokio::test(start_paused = true)]
    async fn mainline_is_pulled() {
        let h = harness(
            FakeRunner::new().with_stdout("git rev-parse --abbrev-ref HEAD", "main\n"),
            FakeResolver::complete(),
        );

        h.orchestrator.run(&h.backend, &FakeResolver::paths()).await;

        let lines = h.runner.lines();
        assert!(lines.contains(&"git pull".to_string()));
        assert!(!lines.iter().any(|l| l.starts_with("git fetch")));
    }

    #[tokio::test(start_paused = true)]
    async fn other_branch_is_only_fetched() {
        let h = harness(
            FakeRunner::new().with_stdout("git rev-parse --abbrev-ref HEAD", "feature/x\n"),
            FakeResolver::complete(),
        );

        h.orchestrator.run(&h.backend, &FakeResolver::paths()).await;

        let lines = h.runner.lines();
        assert!(lines.contains(&"git fetch origin main".to_string()));
        assert!(!lines.contains(&"git pull".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn git_failure_does_not_abort() {
        let h = harness(
            FakeRunner::new().with_spawn_error("git rev-parse --abbrev-ref HEAD"),
            FakeResolver::complete(),
        );

        let outcome = h.orchestrator.run(&h.backend, &FakeResolver::paths()).await;

        assert!(matches!(outcome, UpdateOutcome::Completed));
        assert!(h.runner.lines().contains(&"/usr/bin/pnpm run build".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn missing_package_manager_is_fatal() {
        let h = harness(FakeRunner::new(), FakeResolver::complete().without_package_manager());

        let outcome = h.orchestrator.run(&h.backend, &FakeResolver::paths()).await;

        assert!(matches!(
            outcome,
            UpdateOutcome::Failed(UpdateError::NoPackageManager)
        ));
        assert_eq!(h.backend.calls(), vec!["stop:Some(77)"]);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_runtime_aborts_before_stopping() {
        let h = harness(FakeRunner::new(), FakeResolver::complete());
        let paths = ResolvedPaths::new(None, FakeResolver::paths().entry_artifact);

        let outcome = h.orchestrator.run(&h.backend, &paths).await;

        assert!(matches!(
            outcome,
            UpdateOutcome::Failed(UpdateError::MissingPath(MissingPath::Runtime))
        ));
        assert!(h.backend.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn proceeds_when_port_never_frees() {
        let h = harness(FakeRunner::new(), FakeResolver::complete());
        h.backend.keep_port_after_stop();
        let started = tokio::time::Instant::now();

        let outcome = h.orchestrator.run(&h.backend, &FakeResolver::paths()).await;

        assert!(matches!(outcome, UpdateOutcome::Completed));
        // 20 attempts at 500ms, plus the settle delay.
        assert_eq!(started.elapsed(), Duration::from_secs(12));
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_update_is_a_noop() {
        let h = harness(FakeRunner::new(), FakeResolver::complete());
        let paths = FakeResolver::paths();

        let (first, second) = tokio::join!(
            h.orchestrator.run(&h.backend, &paths),
            h.orchestrator.run(&h.backend, &paths),
        );

        assert!(matches!(first, UpdateOutcome::Completed));
        assert!(matches!(second, UpdateOutcome::Busy));
        assert_eq!(h.notifier.take().len(), 1);
    }
}
