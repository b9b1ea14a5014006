//! Direct-mode ownership of the gateway child process.
//!
//! Idle until `spawn` succeeds, then Owned until the child exits, whether
//! that exit was requested through `terminate` or happened on its own. Every
//! exit is reported once on the channel returned by [`ProcessSupervisor::new`].

use std::fs::File;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use gatewatch_core::{BackendError, GatewayInvocation, ProcessExit, ResolvedPaths};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use super::shutdown::{force_kill_pid, kill_pid, shutdown_child};

/// Grace period between SIGTERM and SIGKILL.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    pub port: u16,
    /// Combined stdout/stderr of the child, truncated on every spawn.
    pub log_path: PathBuf,
    pub grace_period: Duration,
}

impl SupervisorConfig {
    pub fn new(port: u16, log_path: impl Into<PathBuf>) -> Self {
        Self {
            port,
            log_path: log_path.into(),
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }
}

struct StopRequest {
    graceful: bool,
    done: oneshot::Sender<std::io::Result<()>>,
}

/// Live child owned by this supervisor.
struct ProcessHandle {
    pid: u32,
    stop: oneshot::Sender<StopRequest>,
}

type Slot = Arc<Mutex<Option<ProcessHandle>>>;

pub struct ProcessSupervisor {
    config: SupervisorConfig,
    handle: Slot,
    exits: mpsc::UnboundedSender<ProcessExit>,
}

impl ProcessSupervisor {
    /// Create an idle supervisor and the receiver its exit reports go to.
    pub fn new(config: SupervisorConfig) -> (Self, mpsc::UnboundedReceiver<ProcessExit>) {
        let (exits, rx) = mpsc::unbounded_channel();
        let supervisor = Self {
            config,
            handle: Arc::new(Mutex::new(None)),
            exits,
        };
        (supervisor, rx)
    }

    /// PID of the owned child, if any.
    pub fn owned_pid(&self) -> Option<u32> {
        lock(&self.handle).as_ref().map(|h| h.pid)
    }

    /// Spawn the gateway with its output redirected to the log file.
    ///
    /// Returns the existing PID without spawning when a child is already owned.
    pub fn spawn(&self, paths: &ResolvedPaths) -> Result<u32, BackendError> {
        let invocation = GatewayInvocation::for_paths(paths, self.config.port)?;

        if let Some(pid) = self.owned_pid() {
            info!(pid, "Gateway already owned, not spawning another");
            return Ok(pid);
        }

        let mut child = self.build_command(&invocation)?.spawn().map_err(|e| {
            BackendError::Spawn(format!("{}: {e}", invocation.program.display()))
        })?;
        let pid = child
            .id()
            .ok_or_else(|| BackendError::Spawn("child exited before reporting a pid".into()))?;

        let (stop, stop_rx) = oneshot::channel();
        *lock(&self.handle) = Some(ProcessHandle { pid, stop });

        info!(
            pid,
            program = %invocation.program.display(),
            log = %self.config.log_path.display(),
            "Spawned gateway"
        );

        tokio::spawn(monitor(
            child,
            pid,
            stop_rx,
            Arc::clone(&self.handle),
            self.exits.clone(),
            self.config.grace_period,
        ));

        Ok(pid)
    }

    fn build_command(&self, invocation: &GatewayInvocation) -> Result<Command, BackendError> {
        if let Some(dir) = self.config.log_path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        // Fresh log per spawn.
        let stdout = File::create(&self.config.log_path)?;
        let stderr = stdout.try_clone()?;

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .current_dir(&invocation.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr));
        // Keep terminal signals aimed at the CLI away from the gateway.
        #[cfg(unix)]
        cmd.process_group(0);

        let inherited = std::env::var("PATH").ok();
        if let Some(path) = invocation.path_env(inherited.as_deref()) {
            cmd.env("PATH", path);
        }

        Ok(cmd)
    }

    /// Stop the gateway.
    ///
    /// With an owned child this waits until it has been reaped. Without one,
    /// `fallback_pid` (the port holder found by the probe) is signalled
    /// instead; with neither there is nothing to do.
    pub async fn terminate(
        &self,
        graceful: bool,
        fallback_pid: Option<u32>,
    ) -> Result<(), BackendError> {
        let handle = lock(&self.handle).take();

        if let Some(handle) = handle {
            let pid = handle.pid;
            let (done, reply) = oneshot::channel();
            if handle.stop.send(StopRequest { graceful, done }).is_ok() {
                debug!(pid, graceful, "Stopping owned gateway");
                return match reply.await {
                    Ok(result) => result.map_err(|e| BackendError::Signal(e.to_string())),
                    // Monitor finished on its own while we were asking.
                    Err(_) => Ok(()),
                };
            }
            debug!(pid, "Owned gateway already exited");
        }

        let Some(pid) = fallback_pid else {
            debug!("No owned gateway and no port holder to stop");
            return Ok(());
        };

        info!(pid, graceful, "Signalling unowned gateway");
        let result = if graceful {
            kill_pid(pid, self.config.grace_period).await
        } else {
            force_kill_pid(pid)
        };
        result.map_err(|e| BackendError::Signal(format!("pid {pid}: {e}")))
    }
}

/// Wait for the child to exit or for a stop request, then report the exit.
async fn monitor(
    mut child: Child,
    pid: u32,
    mut stop_rx: oneshot::Receiver<StopRequest>,
    slot: Slot,
    exits: mpsc::UnboundedSender<ProcessExit>,
    grace: Duration,
) {
    let (status, mut reply) = tokio::select! {
        status = child.wait() => (status, None),
        Ok(request) = &mut stop_rx => {
            let status = shutdown_child(&mut child, request.graceful, grace).await;
            (status, Some(request.done))
        }
    };

    // The handle goes away before anyone hears about the exit. A handle that
    // is already gone was taken by `terminate`, so the stop was requested even
    // if the child got there first.
    let taken = {
        let mut guard = lock(&slot);
        if guard.as_ref().is_some_and(|h| h.pid == pid) {
            *guard = None;
            false
        } else {
            true
        }
    };
    if reply.is_none() {
        reply = stop_rx.try_recv().ok().map(|request| request.done);
    }

    let requested = taken || reply.is_some();
    let code = match &status {
        Ok(status) => status.code(),
        Err(e) => {
            warn!(pid, error = %e, "Failed waiting for gateway");
            None
        }
    };
    if requested {
        info!(pid, ?code, "Gateway stopped");
    } else {
        warn!(pid, ?code, "Gateway exited on its own");
    }

    let _ = exits.send(ProcessExit {
        pid,
        code,
        requested,
    });
    if let Some(done) = reply {
        let _ = done.send(status.map(|_| ()));
    }
}

fn lock(slot: &Mutex<Option<ProcessHandle>>) -> std::sync::MutexGuard<'_, Option<ProcessHandle>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}
