//! CLI error type and exit-code mapping.

use gatewatch_core::{PathError, RepositoryError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    /// The gateway command ran but reported a failure.
    #[error("{0}")]
    Gateway(String),

    #[error("Invalid arguments: {0}")]
    Arguments(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CliError {
    /// Exit codes follow sysexits.h where a category fits.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Gateway(_) => 1,
            Self::Arguments(_) => 2, // EX_USAGE
            Self::Io(_) => 74,       // EX_IOERR
            Self::Config(_) => 78,   // EX_CONFIG
        }
    }
}

impl From<PathError> for CliError {
    fn from(err: PathError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<RepositoryError> for CliError {
    fn from(err: RepositoryError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
