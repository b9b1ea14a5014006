//! launchd property-list descriptor for the gateway agent.

use std::path::{Path, PathBuf};

use gatewatch_core::{GatewayInvocation, ResolvedPaths};
use plist::{Dictionary, Value};

use super::ServiceError;

/// `PATH` launchd agents start with, before the runtime directory is prepended.
pub const SERVICE_BASE_PATH: &str =
    "/opt/homebrew/bin:/usr/local/bin:/usr/bin:/bin:/usr/sbin:/sbin";

/// Everything written into the agent's plist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor {
    pub label: String,
    pub invocation: GatewayInvocation,
    /// stdout and stderr share this file.
    pub log_path: PathBuf,
}

impl ServiceDescriptor {
    pub fn for_paths(
        label: impl Into<String>,
        paths: &ResolvedPaths,
        port: u16,
        log_path: impl Into<PathBuf>,
    ) -> Result<Self, ServiceError> {
        Ok(Self {
            label: label.into(),
            invocation: GatewayInvocation::for_paths(paths, port)?,
            log_path: log_path.into(),
        })
    }

    pub fn to_value(&self) -> Value {
        let mut dict = Dictionary::new();
        dict.insert("Label".into(), Value::String(self.label.clone()));
        dict.insert(
            "ProgramArguments".into(),
            Value::Array(self.invocation.argv().into_iter().map(Value::String).collect()),
        );
        dict.insert(
            "WorkingDirectory".into(),
            Value::String(path_string(&self.invocation.working_dir)),
        );
        dict.insert("RunAtLoad".into(), Value::Boolean(true));
        dict.insert("KeepAlive".into(), Value::Boolean(true));

        let log = path_string(&self.log_path);
        dict.insert("StandardOutPath".into(), Value::String(log.clone()));
        dict.insert("StandardErrorPath".into(), Value::String(log));

        if let Some(path) = self.invocation.path_env(Some(SERVICE_BASE_PATH)) {
            let mut env = Dictionary::new();
            env.insert("PATH".into(), Value::String(path));
            dict.insert("EnvironmentVariables".into(), Value::Dictionary(env));
        }

        Value::Dictionary(dict)
    }

    /// XML plist text; the encoder escapes `&`, `<` and `>` in every string.
    pub fn to_xml(&self) -> Result<String, ServiceError> {
        let mut buf = Vec::new();
        plist::to_writer_xml(&mut buf, &self.to_value())?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
