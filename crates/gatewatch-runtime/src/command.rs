//! External tool execution on tokio processes.

use std::process::Stdio;

use async_trait::async_trait;
use gatewatch_core::ports::{CommandError, CommandOutput, CommandRunner, CommandSpec};
use tokio::process::Command;
use tracing::debug;

/// Runs commands to completion and captures stdout/stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioCommandRunner;

impl TokioCommandRunner {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, CommandError> {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &spec.current_dir {
            cmd.current_dir(dir);
        }
        for (key, value) in &spec.env {
            cmd.env(key, value);
        }

        let output = cmd.output().await.map_err(|e| CommandError::Spawn {
            program: spec.program.display().to_string(),
            reason: e.to_string(),
        })?;

        let result = CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        debug!(command = %spec.display(), code = ?result.code, "Command finished");
        Ok(result)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_output_and_exit_code() {
        let spec = CommandSpec::new("/bin/sh").args(["-c", "echo out; echo err >&2; exit 3"]);

        let out = TokioCommandRunner::new().run(&spec).await.unwrap();

        assert_eq!(out.code, Some(3));
        assert_eq!(out.stdout.trim(), "out");
        assert_eq!(out.stderr.trim(), "err");
        assert!(!out.success());
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let spec = CommandSpec::new("/definitely/not/a/real/tool");

        let err = TokioCommandRunner::new().run(&spec).await.unwrap_err();

        assert!(matches!(err, CommandError::Spawn { .. }));
    }
}
