//! Compiled-in defaults and per-user file locations.
//!
//! The port is fixed at compile time. File locations can be relocated with
//! `GATEWATCH_DATA_DIR` (supervisor settings) and `GATEWATCH_STATE_DIR`
//! (gateway state directory).

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::services::{PollingConfig, UpdateConfig};

/// Port the gateway listens on and the probe inspects.
pub const GATEWAY_PORT: u16 = 18789;

/// Reverse-DNS label of the per-user service.
pub const SERVICE_LABEL: &str = "dev.lantern.gateway";

/// Name of the globally installed gateway CLI and its npm package.
pub const GATEWAY_CLI_NAME: &str = "lantern";

/// Artifact path relative to a gateway checkout.
pub const ENTRY_ARTIFACT_RELATIVE: &str = "dist/index.js";

/// Runtime interpreter executable name.
pub const RUNTIME_NAME: &str = "node";

/// Branch that is pulled during an update; other branches are only fetched.
pub const MAINLINE_BRANCH: &str = "main";

/// Env var overriding the supervisor's data directory.
pub const DATA_DIR_ENV: &str = "GATEWATCH_DATA_DIR";

/// Env var overriding the gateway state directory.
pub const STATE_DIR_ENV: &str = "GATEWATCH_STATE_DIR";

#[derive(Debug, Error)]
pub enum PathError {
    #[error("Could not determine the home directory")]
    NoHomeDir,

    #[error("Could not determine the user data directory")]
    NoDataDir,
}

/// Fully-resolved configuration handed to the composition root.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub port: u16,
    pub service_label: String,
    /// Gateway state directory (`~/.lantern`).
    pub state_dir: PathBuf,
    /// Combined stdout/stderr log, shared by both backends.
    pub log_path: PathBuf,
    pub sessions_path: PathBuf,
    /// Service descriptor location.
    pub descriptor_path: PathBuf,
    pub settings_path: PathBuf,
    pub polling: PollingConfig,
    pub update: UpdateConfig,
}

impl GatewayConfig {
    /// Create config with default paths for the current user.
    pub fn with_defaults() -> Result<Self, PathError> {
        let home = dirs::home_dir().ok_or(PathError::NoHomeDir)?;
        let state_dir = env_dir(STATE_DIR_ENV).unwrap_or_else(|| home.join(".lantern"));
        let data_dir = match env_dir(DATA_DIR_ENV) {
            Some(dir) => dir,
            None => dirs::data_local_dir()
                .ok_or(PathError::NoDataDir)?
                .join("gatewatch"),
        };

        Ok(Self::rooted_at(&home, &state_dir, &data_dir))
    }

    /// Config with every path derived from explicit roots.
    pub fn rooted_at(home: &Path, state_dir: &Path, data_dir: &Path) -> Self {
        Self {
            port: GATEWAY_PORT,
            service_label: SERVICE_LABEL.to_string(),
            state_dir: state_dir.to_path_buf(),
            log_path: state_dir.join("logs").join("gateway.log"),
            sessions_path: state_dir.join("sessions").join("sessions.json"),
            descriptor_path: home
                .join("Library")
                .join("LaunchAgents")
                .join(format!("{SERVICE_LABEL}.plist")),
            settings_path: data_dir.join("settings.json"),
            polling: PollingConfig::default(),
            update: UpdateConfig::default(),
        }
    }
}

fn env_dir(key: &str) -> Option<PathBuf> {
    std::env::var_os(key)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}
