//! Port-holder inspection with `lsof`.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use gatewatch_core::GatewayStatus;
use gatewatch_core::ports::{CommandOutput, CommandRunner, CommandSpec, StatusProbe};
use tracing::{debug, warn};

const SYSTEM_LSOF: &str = "/usr/sbin/lsof";

/// Upper bound on one inspection; a hung `lsof` reads as `Unknown`.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Finds the process listening on a TCP port.
pub struct LsofStatusProbe {
    runner: Arc<dyn CommandRunner>,
    lsof: PathBuf,
    port: u16,
    timeout: Duration,
}

impl LsofStatusProbe {
    pub fn new(runner: Arc<dyn CommandRunner>, port: u16) -> Self {
        let lsof = if Path::new(SYSTEM_LSOF).exists() {
            PathBuf::from(SYSTEM_LSOF)
        } else {
            PathBuf::from("lsof")
        };
        Self::with_lsof(runner, lsof, port)
    }

    pub const fn with_lsof(runner: Arc<dyn CommandRunner>, lsof: PathBuf, port: u16) -> Self {
        Self {
            runner,
            lsof,
            port,
            timeout: PROBE_TIMEOUT,
        }
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn spec(&self) -> CommandSpec {
        CommandSpec::new(&self.lsof).args([
            "-nP".to_string(),
            format!("-iTCP:{}", self.port),
            "-sTCP:LISTEN".to_string(),
            "-t".to_string(),
        ])
    }
}

#[async_trait]
impl StatusProbe for LsofStatusProbe {
    async fn probe(&self) -> GatewayStatus {
        match tokio::time::timeout(self.timeout, self.runner.run(&self.spec())).await {
            Ok(Ok(output)) => parse_holders(&output),
            Ok(Err(e)) => {
                debug!(error = %e, "Port inspection could not run");
                GatewayStatus::Unknown
            }
            Err(_) => {
                warn!(timeout = ?self.timeout, "Port inspection timed out");
                GatewayStatus::Unknown
            }
        }
    }
}

/// Interpret `lsof -t` output.
///
/// `lsof` exits 1 with no output when nothing matches, so a failing exit is
/// only `Stopped` when it printed nothing at all. Several listeners (IPv4
/// and IPv6 sockets of one process) collapse to one PID; with distinct
/// holders the first listed wins.
pub fn parse_holders(output: &CommandOutput) -> GatewayStatus {
    let mut pids: Vec<u32> = output
        .stdout
        .lines()
        .filter_map(|line| line.trim().parse().ok())
        .collect();
    pids.dedup();

    match pids.first() {
        Some(&pid) => {
            if pids.len() > 1 {
                debug!(?pids, "Multiple port holders, using the first");
            }
            GatewayStatus::Running { pid }
        }
        None if output.success() || output.stderr.trim().is_empty() => GatewayStatus::Stopped,
        None => {
            debug!(stderr = %output.stderr.trim(), "Port inspection failed");
            GatewayStatus::Unknown
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatewatch_core::CommandError;

    enum Behaviour {
        Output(CommandOutput),
        Fail,
        Hang,
    }

    struct StubRunner(Behaviour);

    #[async_trait]
    impl CommandRunner for StubRunner {
        async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, CommandError> {
            match &self.0 {
                Behaviour::Output(out) => Ok(out.clone()),
                Behaviour::Fail => Err(CommandError::Spawn {
                    program: spec.program.display().to_string(),
                    reason: "No such file or directory".to_string(),
                }),
                Behaviour::Hang => std::future::pending().await,
            }
        }
    }

    fn probe(behaviour: Behaviour) -> LsofStatusProbe {
        LsofStatusProbe::with_lsof(
            Arc::new(StubRunner(behaviour)),
            PathBuf::from("/usr/sbin/lsof"),
            18789,
        )
    }

    fn output(code: i32, stdout: &str, stderr: &str) -> CommandOutput {
        CommandOutput {
            code: Some(code),
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
        }
    }

    #[test]
    fn single_holder_is_running() {
        assert_eq!(
            parse_holders(&output(0, "4312\n", "")),
            GatewayStatus::Running { pid: 4312 }
        );
    }

    #[test]
    fn duplicate_sockets_collapse() {
        assert_eq!(
            parse_holders(&output(0, "4312\n4312\n", "")),
            GatewayStatus::Running { pid: 4312 }
        );
    }

    #[test]
    fn no_match_is_stopped() {
        assert_eq!(parse_holders(&output(1, "", "")), GatewayStatus::Stopped);
    }

    #[test]
    fn tool_error_is_unknown() {
        assert_eq!(
            parse_holders(&output(1, "", "lsof: unacceptable port specification")),
            GatewayStatus::Unknown
        );
    }

    #[tokio::test]
    async fn probe_parses_runner_output() {
        let status = probe(Behaviour::Output(output(0, "812\n", ""))).probe().await;
        assert_eq!(status, GatewayStatus::Running { pid: 812 });
    }

    #[tokio::test]
    async fn missing_tool_is_unknown() {
        let probe = probe(Behaviour::Fail);

        assert_eq!(probe.probe().await, GatewayStatus::Unknown);
        assert!(!probe.port_available().await);
    }

    #[tokio::test(start_paused = true)]
    async fn hung_inspection_times_out_as_unknown() {
        let probe = probe(Behaviour::Hang).with_timeout(Duration::from_secs(2));
        let started = tokio::time::Instant::now();

        assert_eq!(probe.probe().await, GatewayStatus::Unknown);
        assert_eq!(started.elapsed(), Duration::from_secs(2));
    }
}
