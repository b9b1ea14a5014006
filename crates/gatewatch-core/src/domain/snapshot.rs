//! Published supervisor state and user-facing notices.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{GatewayStatus, LaunchMode, ResolvedPaths};

/// Everything the presentation layer observes about the gateway.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewaySnapshot {
    pub status: GatewayStatus,
    /// Whether the service descriptor exists on disk.
    pub installed: bool,
    /// Active sessions, 0 unless running.
    pub session_count: usize,
    /// Secondary connectivity from the health endpoint, false unless running.
    pub connected: bool,
    pub launch_mode: LaunchMode,
    pub updating: bool,
    pub paths: ResolvedPaths,
    /// Validation result for the user's artifact override, if one is set.
    pub override_valid: Option<bool>,
    pub last_error: Option<String>,
    pub refreshed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

/// A fire-and-forget notice for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub body: String,
}

impl Notification {
    pub fn info(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            title: title.into(),
            body: body.into(),
        }
    }

    pub fn warning(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Warning,
            title: title.into(),
            body: body.into(),
        }
    }

    pub fn error(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            title: title.into(),
            body: body.into(),
        }
    }
}

/// Exit of a directly-owned gateway process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessExit {
    pub pid: u32,
    pub code: Option<i32>,
    /// True when the exit followed a terminate request from the supervisor.
    pub requested: bool,
}
