//! Persisted supervisor preferences.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::LaunchMode;

/// Supervisor settings.
///
/// Missing fields fall back to defaults so older files keep loading.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Lifecycle strategy used for start/stop/restart.
    pub launch_mode: LaunchMode,

    /// Checkout directory expected to contain the built entry artifact.
    pub entry_override: Option<PathBuf>,
}

impl Settings {
    #[must_use]
    pub const fn with_launch_mode(mut self, mode: LaunchMode) -> Self {
        self.launch_mode = mode;
        self
    }

    #[must_use]
    pub fn with_entry_override(mut self, dir: Option<PathBuf>) -> Self {
        self.entry_override = dir;
        self
    }
}
