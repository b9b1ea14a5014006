//! Gateway liveness as observed through the well-known port.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Observed gateway status.
///
/// Derived solely from port inspection and recomputed on every refresh.
/// `Unknown` means the inspection itself failed and must never be read as
/// confirmed absence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GatewayStatus {
    /// A process holds the well-known port.
    Running { pid: u32 },
    /// Nothing holds the well-known port.
    Stopped,
    /// The port could not be inspected.
    #[default]
    Unknown,
}

impl GatewayStatus {
    /// PID of the port holder, if running.
    pub const fn pid(&self) -> Option<u32> {
        match self {
            Self::Running { pid } => Some(*pid),
            Self::Stopped | Self::Unknown => None,
        }
    }

    pub const fn is_running(&self) -> bool {
        matches!(self, Self::Running { .. })
    }
}

impl fmt::Display for GatewayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running { pid } => write!(f, "running (pid {pid})"),
            Self::Stopped => write!(f, "stopped"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Expected terminal status for an adaptive poll session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollTarget {
    Running,
    Stopped,
}

impl PollTarget {
    /// Whether `status` satisfies this target. `Unknown` satisfies neither.
    pub const fn is_reached_by(self, status: &GatewayStatus) -> bool {
        matches!(
            (self, status),
            (Self::Running, GatewayStatus::Running { .. }) | (Self::Stopped, GatewayStatus::Stopped)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_reaches_no_target() {
        assert!(!PollTarget::Running.is_reached_by(&GatewayStatus::Unknown));
        assert!(!PollTarget::Stopped.is_reached_by(&GatewayStatus::Unknown));
    }

    #[test]
    fn running_target_ignores_pid() {
        assert!(PollTarget::Running.is_reached_by(&GatewayStatus::Running { pid: 42 }));
        assert!(!PollTarget::Running.is_reached_by(&GatewayStatus::Stopped));
    }

    #[test]
    fn pid_only_when_running() {
        assert_eq!(GatewayStatus::Running { pid: 7 }.pid(), Some(7));
        assert_eq!(GatewayStatus::Stopped.pid(), None);
        assert_eq!(GatewayStatus::Unknown.pid(), None);
    }
}
