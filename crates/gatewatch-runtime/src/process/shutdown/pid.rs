//! Signal a gateway by PID when no `Child` handle is available.

use std::io;
use std::time::Duration;

#[cfg(unix)]
use nix::errno::Errno;
#[cfg(unix)]
use nix::sys::signal::{self, Signal};
#[cfg(unix)]
use nix::unistd::Pid;
#[cfg(unix)]
use tokio::time::{Instant, sleep};

#[cfg(unix)]
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// SIGTERM, wait up to `grace` for the process to disappear, then SIGKILL.
///
/// A process that is already gone counts as success. The process is not
/// reaped; that is its parent's job.
pub async fn kill_pid(pid: u32, grace: Duration) -> io::Result<()> {
    #[cfg(unix)]
    {
        let target = to_nix_pid(pid)?;

        if !send(target, Signal::SIGTERM)? {
            return Ok(());
        }
        if wait_gone(target, grace).await {
            return Ok(());
        }

        tracing::warn!(pid, "Gateway ignored SIGTERM, escalating to SIGKILL");
        if !send(target, Signal::SIGKILL)? {
            return Ok(());
        }
        if wait_gone(target, grace).await {
            return Ok(());
        }

        Err(io::Error::new(
            io::ErrorKind::TimedOut,
            format!("process {pid} did not exit after SIGKILL"),
        ))
    }

    #[cfg(not(unix))]
    {
        let _ = (pid, grace);
        Err(unsupported())
    }
}

/// SIGKILL without waiting.
pub fn force_kill_pid(pid: u32) -> io::Result<()> {
    #[cfg(unix)]
    {
        send(to_nix_pid(pid)?, Signal::SIGKILL).map(|_| ())
    }

    #[cfg(not(unix))]
    {
        let _ = pid;
        Err(unsupported())
    }
}

#[cfg(unix)]
fn to_nix_pid(pid: u32) -> io::Result<Pid> {
    i32::try_from(pid)
        .map(Pid::from_raw)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, format!("invalid pid {pid}")))
}

/// Deliver `sig`; `Ok(false)` when the process no longer exists.
#[cfg(unix)]
fn send(target: Pid, sig: Signal) -> io::Result<bool> {
    match signal::kill(target, sig) {
        Ok(()) => Ok(true),
        Err(Errno::ESRCH) => Ok(false),
        Err(e) => Err(io::Error::other(e)),
    }
}

#[cfg(unix)]
async fn wait_gone(target: Pid, within: Duration) -> bool {
    let deadline = Instant::now() + within;
    while Instant::now() < deadline {
        sleep(POLL_INTERVAL).await;
        // EPERM means it exists but belongs to someone else; keep waiting.
        if matches!(signal::kill(target, None), Err(Errno::ESRCH)) {
            return true;
        }
    }
    false
}

#[cfg(not(unix))]
fn unsupported() -> io::Error {
    io::Error::new(
        io::ErrorKind::Unsupported,
        "signalling by pid is only supported on unix",
    )
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::process::ExitStatusExt;
    use tokio::process::Command;

    // Above any kernel's pid_max.
    const ABSENT_PID: u32 = i32::MAX as u32;

    #[tokio::test]
    async fn absent_pid_is_already_gone() {
        assert!(kill_pid(ABSENT_PID, Duration::from_millis(200)).await.is_ok());
        assert!(force_kill_pid(ABSENT_PID).is_ok());
    }

    #[tokio::test]
    async fn terminates_with_sigterm() {
        let mut child = Command::new("sleep").arg("60").spawn().unwrap();
        let pid = child.id().unwrap();

        // Waiting concurrently reaps the child so the poll sees ESRCH.
        let (killed, status) = tokio::join!(kill_pid(pid, Duration::from_secs(5)), child.wait());

        assert!(killed.is_ok());
        assert_eq!(status.unwrap().signal(), Some(Signal::SIGTERM as i32));
    }

    #[tokio::test]
    async fn force_kill_sends_sigkill() {
        let mut child = Command::new("sleep").arg("60").spawn().unwrap();
        let pid = child.id().unwrap();

        force_kill_pid(pid).unwrap();
        let status = child.wait().await.unwrap();

        assert_eq!(status.signal(), Some(Signal::SIGKILL as i32));
    }
}
