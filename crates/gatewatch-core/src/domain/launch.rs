//! Launch strategy, resolved paths and the gateway invocation contract.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Subcommand the gateway CLI is launched with.
pub const GATEWAY_SUBCOMMAND: &str = "gateway";

/// Artifact extensions that must be run through the runtime interpreter.
const SCRIPT_EXTENSIONS: [&str; 3] = ["js", "mjs", "cjs"];

/// Directory name of the conventional nested build layout (`<checkout>/dist/index.js`).
const BUILD_OUTPUT_DIR: &str = "dist";

/// Lifecycle strategy for the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaunchMode {
    /// The supervisor spawns and owns the gateway process.
    #[default]
    Direct,
    /// The per-user OS service manager owns the gateway.
    ManagedService,
}

impl fmt::Display for LaunchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct => write!(f, "direct"),
            Self::ManagedService => write!(f, "managed-service"),
        }
    }
}

/// Which half of [`ResolvedPaths`] is unresolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MissingPath {
    #[error("runtime interpreter not found")]
    Runtime,
    #[error("gateway entry artifact not found")]
    EntryArtifact,
}

/// Runtime interpreter and entry artifact, each optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPaths {
    pub runtime: Option<PathBuf>,
    pub entry_artifact: Option<PathBuf>,
}

impl ResolvedPaths {
    pub const fn new(runtime: Option<PathBuf>, entry_artifact: Option<PathBuf>) -> Self {
        Self {
            runtime,
            entry_artifact,
        }
    }

    pub const fn is_complete(&self) -> bool {
        self.runtime.is_some() && self.entry_artifact.is_some()
    }

    /// Both paths, or the first missing one (runtime is checked first).
    pub fn require(&self) -> Result<(&Path, &Path), MissingPath> {
        let runtime = self.runtime.as_deref().ok_or(MissingPath::Runtime)?;
        let artifact = self
            .entry_artifact
            .as_deref()
            .ok_or(MissingPath::EntryArtifact)?;
        Ok((runtime, artifact))
    }
}

/// Fully-formed command line for launching the gateway.
///
/// Shared by the direct supervisor and the service descriptor so both
/// backends run the exact same thing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayInvocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    /// Directory of the runtime, prepended to `PATH` so shebang launchers find it.
    pub runtime_dir: Option<PathBuf>,
}

impl GatewayInvocation {
    /// Build the invocation for `paths` listening on `port`.
    ///
    /// Scripts run as `<runtime> <artifact> gateway --port N --force`,
    /// executables as `<artifact> gateway --port N --force`.
    pub fn for_paths(paths: &ResolvedPaths, port: u16) -> Result<Self, MissingPath> {
        let (runtime, artifact) = paths.require()?;

        let tail = [
            GATEWAY_SUBCOMMAND.to_string(),
            "--port".to_string(),
            port.to_string(),
            "--force".to_string(),
        ];

        let (program, args) = if is_script(artifact) {
            let mut args = vec![artifact.to_string_lossy().into_owned()];
            args.extend(tail);
            (runtime.to_path_buf(), args)
        } else {
            (artifact.to_path_buf(), tail.to_vec())
        };

        Ok(Self {
            program,
            args,
            working_dir: working_dir_for(artifact),
            runtime_dir: runtime.parent().map(Path::to_path_buf),
        })
    }

    /// Program followed by its arguments.
    pub fn argv(&self) -> Vec<String> {
        let mut argv = vec![self.program.to_string_lossy().into_owned()];
        argv.extend(self.args.iter().cloned());
        argv
    }

    /// `PATH` value with the runtime directory in front of `base`.
    pub fn path_env(&self, base: Option<&str>) -> Option<String> {
        let dir = self.runtime_dir.as_ref()?.to_string_lossy().into_owned();
        Some(match base {
            Some(base) if !base.is_empty() => format!("{dir}:{base}"),
            _ => dir,
        })
    }
}

/// Whether the artifact is a script that needs the runtime interpreter.
pub fn is_script(artifact: &Path) -> bool {
    artifact
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SCRIPT_EXTENSIONS.contains(&ext))
}

/// Working directory for the gateway.
///
/// `<checkout>/dist/index.js` runs from `<checkout>`; anything else runs
/// from the artifact's own directory.
pub fn working_dir_for(artifact: &Path) -> PathBuf {
    let Some(parent) = artifact.parent() else {
        return PathBuf::from("/");
    };

    if parent.file_name().and_then(|n| n.to_str()) == Some(BUILD_OUTPUT_DIR) {
        if let Some(grandparent) = parent.parent() {
            return grandparent.to_path_buf();
        }
    }

    parent.to_path_buf()
}
