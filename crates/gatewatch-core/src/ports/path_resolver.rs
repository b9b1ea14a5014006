//! Path resolution port.

use std::path::{Path, PathBuf};

/// Locates the runtime, the gateway entry artifact and a package manager.
///
/// Results are never assumed stable; callers re-resolve after any explicit
/// path change. Implementations may block on filesystem or tool queries.
pub trait PathResolver: Send + Sync {
    fn resolve_runtime(&self) -> Option<PathBuf>;

    /// Resolve the entry artifact, trying `override_dir` first when it validates.
    fn resolve_entry_artifact(&self, override_dir: Option<&Path>) -> Option<PathBuf>;

    fn resolve_package_manager(&self) -> Option<PathBuf>;

    /// Whether `dir` contains the expected relative artifact.
    fn validate_override(&self, dir: &Path) -> bool;
}
