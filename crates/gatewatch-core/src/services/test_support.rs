//! In-memory fakes for the core ports.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::domain::{GatewayStatus, LaunchMode, Notification, ResolvedPaths};
use crate::ports::{
    BackendError, CommandError, CommandOutput, CommandRunner, CommandSpec, GatewayBackend,
    HealthCheck, Notifier, PathResolver, ServiceInstaller, SessionCounter, StatusProbe,
};

pub const FAKE_PID: u32 = 4242;

/// Probe returning whatever status was last set.
pub struct FakeProbe {
    status: Mutex<GatewayStatus>,
    probes: AtomicUsize,
}

impl FakeProbe {
    pub fn new(status: GatewayStatus) -> Self {
        Self {
            status: Mutex::new(status),
            probes: AtomicUsize::new(0),
        }
    }

    pub fn set(&self, status: GatewayStatus) {
        *self.status.lock().unwrap() = status;
    }

    pub fn current(&self) -> GatewayStatus {
        *self.status.lock().unwrap()
    }

    pub fn probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StatusProbe for FakeProbe {
    async fn probe(&self) -> GatewayStatus {
        self.probes.fetch_add(1, Ordering::SeqCst);
        self.current()
    }
}

/// Backend that flips the shared probe like a real gateway would.
pub struct FakeBackend {
    mode: LaunchMode,
    probe: Arc<FakeProbe>,
    calls: Mutex<Vec<String>>,
    fail_start: AtomicBool,
    fail_stop: AtomicBool,
    hold_port: AtomicBool,
    installed: AtomicBool,
}

impl FakeBackend {
    pub fn direct(probe: Arc<FakeProbe>) -> Self {
        Self::with_mode(LaunchMode::Direct, probe)
    }

    pub fn managed(probe: Arc<FakeProbe>) -> Self {
        Self::with_mode(LaunchMode::ManagedService, probe)
    }

    fn with_mode(mode: LaunchMode, probe: Arc<FakeProbe>) -> Self {
        Self {
            mode,
            probe,
            calls: Mutex::new(Vec::new()),
            fail_start: AtomicBool::new(false),
            fail_stop: AtomicBool::new(false),
            hold_port: AtomicBool::new(false),
            installed: AtomicBool::new(false),
        }
    }

    pub fn fail_start(&self) {
        self.fail_start.store(true, Ordering::SeqCst);
    }

    pub fn fail_stop(&self) {
        self.fail_stop.store(true, Ordering::SeqCst);
    }

    /// Stop succeeds but the port stays held.
    pub fn keep_port_after_stop(&self) {
        self.hold_port.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl GatewayBackend for FakeBackend {
    fn mode(&self) -> LaunchMode {
        self.mode
    }

    async fn start(&self, paths: &ResolvedPaths) -> Result<(), BackendError> {
        self.record("start".to_string());
        paths.require()?;
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(BackendError::Spawn("boom".to_string()));
        }
        self.probe.set(GatewayStatus::Running { pid: FAKE_PID });
        Ok(())
    }

    async fn stop(&self, known_pid: Option<u32>) -> Result<(), BackendError> {
        self.record(format!("stop:{known_pid:?}"));
        if self.fail_stop.load(Ordering::SeqCst) {
            return Err(BackendError::Signal("refused".to_string()));
        }
        if !self.hold_port.load(Ordering::SeqCst) {
            self.probe.set(GatewayStatus::Stopped);
        }
        Ok(())
    }

    async fn restart(
        &self,
        paths: &ResolvedPaths,
        known_pid: Option<u32>,
    ) -> Result<(), BackendError> {
        self.record(format!("restart:{known_pid:?}"));
        paths.require()?;
        self.probe.set(GatewayStatus::Running {
            pid: FAKE_PID + 1,
        });
        Ok(())
    }

    fn is_installed(&self) -> bool {
        self.installed.load(Ordering::SeqCst)
    }
}

/// Installer toggling an in-memory flag.
pub struct FakeInstaller {
    probe: Arc<FakeProbe>,
    installed: AtomicBool,
    calls: Mutex<Vec<String>>,
}

impl FakeInstaller {
    pub fn new(probe: Arc<FakeProbe>) -> Self {
        Self {
            probe,
            installed: AtomicBool::new(false),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ServiceInstaller for FakeInstaller {
    fn is_installed(&self) -> bool {
        self.installed.load(Ordering::SeqCst)
    }

    async fn install(&self, paths: &ResolvedPaths) -> Result<(), BackendError> {
        self.calls.lock().unwrap().push("install".to_string());
        paths.require()?;
        self.installed.store(true, Ordering::SeqCst);
        self.probe.set(GatewayStatus::Running { pid: FAKE_PID });
        Ok(())
    }

    async fn uninstall(&self) -> Result<(), BackendError> {
        self.calls.lock().unwrap().push("uninstall".to_string());
        self.installed.store(false, Ordering::SeqCst);
        self.probe.set(GatewayStatus::Stopped);
        Ok(())
    }
}

enum Scripted {
    Output(CommandOutput),
    SpawnError,
}

/// Runner keyed by the full command line; unknown commands succeed silently.
#[derive(Default)]
pub struct FakeRunner {
    scripted: HashMap<String, Scripted>,
    lines: Mutex<Vec<String>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_stdout(mut self, line: &str, stdout: &str) -> Self {
        self.scripted.insert(
            line.to_string(),
            Scripted::Output(CommandOutput {
                code: Some(0),
                stdout: stdout.to_string(),
                stderr: String::new(),
            }),
        );
        self
    }

    #[must_use]
    pub fn with_exit(mut self, line: &str, code: i32) -> Self {
        self.scripted.insert(
            line.to_string(),
            Scripted::Output(CommandOutput {
                code: Some(code),
                stdout: String::new(),
                stderr: "failed".to_string(),
            }),
        );
        self
    }

    #[must_use]
    pub fn with_spawn_error(mut self, line: &str) -> Self {
        self.scripted.insert(line.to_string(), Scripted::SpawnError);
        self
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, CommandError> {
        let line = spec.display();
        self.lines.lock().unwrap().push(line.clone());
        match self.scripted.get(&line) {
            Some(Scripted::Output(out)) => Ok(out.clone()),
            Some(Scripted::SpawnError) => Err(CommandError::Spawn {
                program: spec.program.display().to_string(),
                reason: "not found".to_string(),
            }),
            None => Ok(CommandOutput {
                code: Some(0),
                ..CommandOutput::default()
            }),
        }
    }
}

/// Resolver with fixed answers and a call counter.
pub struct FakeResolver {
    runtime: Option<PathBuf>,
    artifact: Option<PathBuf>,
    package_manager: Option<PathBuf>,
    valid_overrides: HashSet<PathBuf>,
    resolutions: AtomicUsize,
}

impl FakeResolver {
    pub const RUNTIME: &'static str = "/usr/local/bin/node";
    pub const ARTIFACT: &'static str = "/src/lantern/dist/index.js";

    pub fn complete() -> Self {
        Self {
            runtime: Some(PathBuf::from(Self::RUNTIME)),
            artifact: Some(PathBuf::from(Self::ARTIFACT)),
            package_manager: Some(PathBuf::from("/usr/bin/pnpm")),
            valid_overrides: HashSet::new(),
            resolutions: AtomicUsize::new(0),
        }
    }

    pub fn paths() -> ResolvedPaths {
        ResolvedPaths::new(
            Some(PathBuf::from(Self::RUNTIME)),
            Some(PathBuf::from(Self::ARTIFACT)),
        )
    }

    #[must_use]
    pub fn without_runtime(mut self) -> Self {
        self.runtime = None;
        self
    }

    #[must_use]
    pub fn without_package_manager(mut self) -> Self {
        self.package_manager = None;
        self
    }

    #[must_use]
    pub fn with_valid_override(mut self, dir: impl Into<PathBuf>) -> Self {
        self.valid_overrides.insert(dir.into());
        self
    }

    pub fn resolutions(&self) -> usize {
        self.resolutions.load(Ordering::SeqCst)
    }
}

impl PathResolver for FakeResolver {
    fn resolve_runtime(&self) -> Option<PathBuf> {
        self.resolutions.fetch_add(1, Ordering::SeqCst);
        self.runtime.clone()
    }

    fn resolve_entry_artifact(&self, override_dir: Option<&Path>) -> Option<PathBuf> {
        match override_dir {
            Some(dir) if self.validate_override(dir) => Some(dir.join("dist/index.js")),
            _ => self.artifact.clone(),
        }
    }

    fn resolve_package_manager(&self) -> Option<PathBuf> {
        self.package_manager.clone()
    }

    fn validate_override(&self, dir: &Path) -> bool {
        self.valid_overrides.contains(dir)
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    notes: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.notes.lock().unwrap())
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.notes.lock().unwrap().push(notification);
    }
}

#[derive(Default)]
pub struct FakeHealth {
    calls: AtomicUsize,
}

impl FakeHealth {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HealthCheck for FakeHealth {
    async fn check(&self) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        true
    }
}

pub struct FakeSessions(pub usize);

#[async_trait]
impl SessionCounter for FakeSessions {
    async fn count(&self) -> usize {
        self.0
    }
}
