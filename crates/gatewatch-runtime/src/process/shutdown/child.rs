//! Stop an owned `tokio::process::Child` and reap it.

use std::io;
use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::Child;

#[cfg(unix)]
use nix::sys::signal::{self, Signal};
#[cfg(unix)]
use nix::unistd::Pid;
#[cfg(unix)]
use tokio::time::timeout;

/// Stop `child` and wait for it to be reaped.
///
/// Graceful: SIGTERM, then SIGKILL if it is still running after `grace`.
/// Forced: SIGKILL straight away. On non-unix targets both are a kill.
pub async fn shutdown_child(
    child: &mut Child,
    graceful: bool,
    grace: Duration,
) -> io::Result<ExitStatus> {
    #[cfg(unix)]
    if graceful {
        if let Some(status) = terminate_unix(child, grace).await? {
            return Ok(status);
        }
        tracing::warn!(pid = ?child.id(), "Gateway still running after grace period");
    }

    #[cfg(not(unix))]
    let _ = (graceful, grace);

    child.kill().await?;
    child.wait().await
}

/// SIGTERM and wait; `None` if the grace period ran out.
#[cfg(unix)]
async fn terminate_unix(child: &mut Child, grace: Duration) -> io::Result<Option<ExitStatus>> {
    // `id()` is None once the child has been reaped.
    let Some(pid) = child.id() else {
        return child.wait().await.map(Some);
    };
    let pid = i32::try_from(pid)
        .map(Pid::from_raw)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "pid out of range"))?;

    match signal::kill(pid, Signal::SIGTERM) {
        Ok(()) => {}
        Err(nix::errno::Errno::ESRCH) => return child.wait().await.map(Some),
        Err(e) => return Err(io::Error::other(e)),
    }

    match timeout(grace, child.wait()).await {
        Ok(status) => status.map(Some),
        Err(_) => Ok(None),
    }
}
