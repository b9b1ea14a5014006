//! Individual search strategies. Each returns the attempts it made and
//! stops at the first usable candidate.

use std::path::{Path, PathBuf};

use super::env::EnvProvider;
use super::fs::FsProvider;
use super::types::{Attempt, AttemptOutcome};
use super::version::sort_versions_desc;

pub struct Searcher<'a> {
    env: &'a dyn EnvProvider,
    fs: &'a dyn FsProvider,
}

impl<'a> Searcher<'a> {
    pub fn new(env: &'a dyn EnvProvider, fs: &'a dyn FsProvider) -> Self {
        Self { env, fs }
    }

    /// `command` in each `$PATH` directory.
    pub fn in_path(&self, command: &str) -> Vec<Attempt> {
        let candidates = self.env.path_dirs().into_iter().map(|dir| dir.join(command));
        self.first_executable(candidates)
    }

    /// `command` inside the nvm version directories, highest version first.
    ///
    /// `$NVM_DIR` overrides the default `~/.nvm`.
    pub fn in_version_manager(&self, command: &str) -> Vec<Attempt> {
        let Some(root) = self.nvm_root() else {
            return Vec::new();
        };
        let versions_dir = root.join("versions").join("node");
        let versions = sort_versions_desc(&self.fs.list_dir(&versions_dir));

        let candidates = versions
            .into_iter()
            .map(|v| versions_dir.join(v).join("bin").join(command));
        self.first_executable(candidates)
    }

    /// `command` in the fixed conventional install directories.
    pub fn in_platform_defaults(&self, command: &str) -> Vec<Attempt> {
        let candidates = PLATFORM_DEFAULT_DIRS
            .iter()
            .map(|dir| Path::new(dir).join(command));
        self.first_executable(candidates)
    }

    /// First regular file among `candidates`.
    pub fn first_file(&self, candidates: impl IntoIterator<Item = PathBuf>) -> Vec<Attempt> {
        self.probe_each(candidates, |path| self.fs.check_file(path))
    }

    fn first_executable(&self, candidates: impl IntoIterator<Item = PathBuf>) -> Vec<Attempt> {
        self.probe_each(candidates, |path| self.fs.check_executable(path))
    }

    fn probe_each(
        &self,
        candidates: impl IntoIterator<Item = PathBuf>,
        check: impl Fn(&Path) -> AttemptOutcome,
    ) -> Vec<Attempt> {
        let mut attempts = Vec::new();
        for candidate in candidates {
            let outcome = check(&candidate);
            let found = outcome == AttemptOutcome::Ok;
            attempts.push(Attempt { candidate, outcome });
            if found {
                break;
            }
        }
        attempts
    }

    fn nvm_root(&self) -> Option<PathBuf> {
        self.env
            .var("NVM_DIR")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| self.env.home().map(|home| home.join(".nvm")))
    }
}

/// Conventional install directories, checked in order.
#[cfg(target_os = "macos")]
const PLATFORM_DEFAULT_DIRS: &[&str] = &[
    "/opt/homebrew/bin", // Apple Silicon Homebrew
    "/usr/local/bin",    // Intel Homebrew / manual installs
    "/usr/bin",
];

#[cfg(not(target_os = "macos"))]
const PLATFORM_DEFAULT_DIRS: &[&str] = &["/usr/local/bin", "/usr/bin", "/bin"];
