//! Package-manager global-root query, the last-resort artifact lookup.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

pub trait GlobalRootProvider: Send + Sync {
    /// Global `node_modules` directory reported by `npm`.
    fn global_root(&self, npm: &Path) -> Option<PathBuf>;
}

/// Runs `npm root -g`.
pub struct NpmGlobalRoot;

impl GlobalRootProvider for NpmGlobalRoot {
    fn global_root(&self, npm: &Path) -> Option<PathBuf> {
        let mut cmd = Command::new(npm);
        cmd.args(["root", "-g"])
            .stdin(Stdio::null())
            .stderr(Stdio::null());

        // npm is a node script; make sure its own node is found first.
        if let Some(dir) = npm.parent() {
            let inherited = std::env::var_os("PATH").unwrap_or_default();
            let mut dirs = vec![dir.to_path_buf()];
            dirs.extend(std::env::split_paths(&inherited));
            if let Ok(joined) = std::env::join_paths(dirs) {
                cmd.env("PATH", joined);
            }
        }

        let output = match cmd.output() {
            Ok(output) if output.status.success() => output,
            Ok(output) => {
                debug!(status = ?output.status.code(), "npm root -g failed");
                return None;
            }
            Err(e) => {
                debug!(error = %e, "npm root -g could not run");
                return None;
            }
        };

        let root = String::from_utf8_lossy(&output.stdout).trim().to_string();
        (!root.is_empty()).then(|| PathBuf::from(root))
    }
}

#[cfg(test)]
pub struct MockGlobalRoot(pub Option<PathBuf>);

#[cfg(test)]
impl GlobalRootProvider for MockGlobalRoot {
    fn global_root(&self, _npm: &Path) -> Option<PathBuf> {
        self.0.clone()
    }
}
