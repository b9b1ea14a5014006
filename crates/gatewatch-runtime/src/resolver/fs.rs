//! Filesystem access for path resolution (injectable for testing).

use std::path::Path;

use super::types::AttemptOutcome;

pub trait FsProvider: Send + Sync {
    /// Whether `path` is an existing executable file.
    fn check_executable(&self, path: &Path) -> AttemptOutcome;

    /// Whether `path` is an existing regular file.
    fn check_file(&self, path: &Path) -> AttemptOutcome;

    /// Names of the entries directly inside `dir`; empty when unreadable.
    fn list_dir(&self, dir: &Path) -> Vec<String>;
}

/// Real filesystem.
pub struct SystemFs;

impl FsProvider for SystemFs {
    fn check_executable(&self, path: &Path) -> AttemptOutcome {
        let metadata = match std::fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(e) => return outcome_for_error(&e),
        };
        if !metadata.is_file() {
            return AttemptOutcome::NotAFile;
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if metadata.permissions().mode() & 0o111 == 0 {
                return AttemptOutcome::NotExecutable;
            }
        }

        AttemptOutcome::Ok
    }

    fn check_file(&self, path: &Path) -> AttemptOutcome {
        match std::fs::metadata(path) {
            Ok(metadata) if metadata.is_file() => AttemptOutcome::Ok,
            Ok(_) => AttemptOutcome::NotAFile,
            Err(e) => outcome_for_error(&e),
        }
    }

    fn list_dir(&self, dir: &Path) -> Vec<String> {
        std::fs::read_dir(dir)
            .map(|entries| {
                entries
                    .filter_map(Result::ok)
                    .filter_map(|e| e.file_name().into_string().ok())
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn outcome_for_error(e: &std::io::Error) -> AttemptOutcome {
    match e.kind() {
        std::io::ErrorKind::NotFound => AttemptOutcome::NotFound,
        std::io::ErrorKind::PermissionDenied => AttemptOutcome::PermissionDenied,
        _ => AttemptOutcome::IoError(e.to_string()),
    }
}

/// In-memory filesystem for tests.
#[cfg(test)]
#[derive(Default)]
pub struct MockFs {
    executables: std::collections::HashSet<std::path::PathBuf>,
    files: std::collections::HashSet<std::path::PathBuf>,
    dirs: std::collections::HashMap<std::path::PathBuf, Vec<String>>,
}

#[cfg(test)]
impl MockFs {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_executable(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        let path = path.into();
        self.files.insert(path.clone());
        self.executables.insert(path);
        self
    }

    #[must_use]
    pub fn with_file(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.files.insert(path.into());
        self
    }

    #[must_use]
    pub fn with_dir(mut self, path: impl Into<std::path::PathBuf>, entries: &[&str]) -> Self {
        self.dirs.insert(
            path.into(),
            entries.iter().map(|e| (*e).to_string()).collect(),
        );
        self
    }
}

#[cfg(test)]
impl FsProvider for MockFs {
    fn check_executable(&self, path: &Path) -> AttemptOutcome {
        if self.executables.contains(path) {
            AttemptOutcome::Ok
        } else if self.files.contains(path) {
            AttemptOutcome::NotExecutable
        } else {
            AttemptOutcome::NotFound
        }
    }

    fn check_file(&self, path: &Path) -> AttemptOutcome {
        if self.files.contains(path) {
            AttemptOutcome::Ok
        } else if self.dirs.contains_key(path) {
            AttemptOutcome::NotAFile
        } else {
            AttemptOutcome::NotFound
        }
    }

    fn list_dir(&self, dir: &Path) -> Vec<String> {
        self.dirs.get(dir).cloned().unwrap_or_default()
    }
}
