//! Types for gateway path resolution.

use std::fmt;
use std::path::PathBuf;

/// Outcome of one resolution, with every candidate checked along the way.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// The first candidate that passed, if any.
    pub resolved: Option<PathBuf>,
    /// All locations that were checked during resolution (for diagnostics).
    pub attempts: Vec<Attempt>,
}

impl Resolution {
    /// Append attempts, recording the first success if none yet.
    pub fn extend(&mut self, attempts: Vec<Attempt>) {
        if self.resolved.is_none() {
            self.resolved = attempts
                .iter()
                .find(|a| a.outcome == AttemptOutcome::Ok)
                .map(|a| a.candidate.clone());
        }
        self.attempts.extend(attempts);
    }

    pub const fn is_resolved(&self) -> bool {
        self.resolved.is_some()
    }
}

/// A single attempt to locate a file at a candidate path.
#[derive(Debug, Clone)]
pub struct Attempt {
    /// The path that was checked.
    pub candidate: PathBuf,
    /// The outcome of checking this candidate.
    pub outcome: AttemptOutcome,
}

/// Possible outcomes when checking a candidate path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Candidate is usable (success case).
    Ok,
    /// Path does not exist.
    NotFound,
    /// Path exists but is not a file (e.g., directory).
    NotAFile,
    /// File exists but is not executable.
    NotExecutable,
    /// Permission denied when checking the path.
    PermissionDenied,
    /// Other I/O error occurred.
    IoError(String),
}

impl fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "OK"),
            Self::NotFound => write!(f, "not found"),
            Self::NotAFile => write!(f, "not a file"),
            Self::NotExecutable => write!(f, "not executable"),
            Self::PermissionDenied => write!(f, "permission denied"),
            Self::IoError(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl fmt::Display for Attempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = if self.outcome == AttemptOutcome::Ok {
            '✓'
        } else {
            '✗'
        };
        write!(f, "{mark} {}: {}", self.candidate.display(), self.outcome)
    }
}
