//! Transition detection between definite gateway states.

use crate::domain::GatewayStatus;

/// A change between Running and Stopped worth telling the user about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Started { pid: u32 },
    Stopped,
}

/// Remembers the last definite status and reports changes exactly once.
///
/// `Unknown` never updates the remembered status, and the very first
/// definite observation establishes a baseline without reporting.
#[derive(Debug, Default)]
pub struct TransitionTracker {
    last_running: Option<bool>,
    running_pid: Option<u32>,
    /// PID whose stop was reported as a plain `Stopped` transition.
    stop_reported_for: Option<u32>,
    suppress_next_stop: bool,
}

impl TransitionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one probe result.
    pub fn observe(&mut self, status: GatewayStatus) -> Option<Transition> {
        let running = match status {
            GatewayStatus::Running { pid } => {
                self.running_pid = Some(pid);
                true
            }
            GatewayStatus::Stopped => false,
            GatewayStatus::Unknown => return None,
        };

        let previous = self.last_running.replace(running);
        if previous.is_none() || previous == Some(running) {
            return None;
        }

        match status {
            GatewayStatus::Running { pid } => {
                self.suppress_next_stop = false;
                self.stop_reported_for = None;
                Some(Transition::Started { pid })
            }
            _ if self.suppress_next_stop => {
                self.suppress_next_stop = false;
                None
            }
            _ => {
                self.stop_reported_for = self.running_pid;
                Some(Transition::Stopped)
            }
        }
    }

    /// Record an unsolicited exit of `pid`.
    ///
    /// Returns whether the exit still needs its own notice. While the gateway
    /// is seen running, the matching stop transition is swallowed instead;
    /// once the stop of `pid` has already been reported, the exit is not
    /// announced again.
    pub fn note_unexpected_exit(&mut self, pid: u32) -> bool {
        match self.last_running {
            Some(true) => {
                self.suppress_next_stop = true;
                true
            }
            Some(false) => self.stop_reported_for != Some(pid),
            None => true,
        }
    }

    /// Last definite status seen, if any.
    pub const fn last_running(&self) -> Option<bool> {
        self.last_running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RUNNING: GatewayStatus = GatewayStatus::Running { pid: 100 };

    #[test]
    fn first_observation_is_baseline() {
        let mut tracker = TransitionTracker::new();
        assert_eq!(tracker.observe(RUNNING), None);
        assert_eq!(tracker.last_running(), Some(true));
    }

    #[test]
    fn stable_status_reports_nothing() {
        let mut tracker = TransitionTracker::new();
        tracker.observe(GatewayStatus::Stopped);
        for _ in 0..10 {
            assert_eq!(tracker.observe(GatewayStatus::Stopped), None);
        }
    }

    #[test]
    fn each_change_reported_once() {
        let mut tracker = TransitionTracker::new();
        tracker.observe(GatewayStatus::Stopped);
        assert_eq!(
            tracker.observe(RUNNING),
            Some(Transition::Started { pid: 100 })
        );
        assert_eq!(tracker.observe(RUNNING), None);
        assert_eq!(
            tracker.observe(GatewayStatus::Stopped),
            Some(Transition::Stopped)
        );
        assert_eq!(tracker.observe(GatewayStatus::Stopped), None);
    }

    #[test]
    fn unknown_does_not_break_the_baseline() {
        let mut tracker = TransitionTracker::new();
        tracker.observe(RUNNING);
        assert_eq!(tracker.observe(GatewayStatus::Unknown), None);
        assert_eq!(tracker.observe(RUNNING), None);
        assert_eq!(tracker.last_running(), Some(true));
    }

    #[test]
    fn unexpected_exit_swallows_following_stop() {
        let mut tracker = TransitionTracker::new();
        tracker.observe(RUNNING);
        assert!(tracker.note_unexpected_exit(100));
        assert_eq!(tracker.observe(GatewayStatus::Stopped), None);

        // Later stops are reported again.
        tracker.observe(RUNNING);
        assert_eq!(
            tracker.observe(GatewayStatus::Stopped),
            Some(Transition::Stopped)
        );
    }

    #[test]
    fn unexpected_exit_while_stopped_is_ignored() {
        let mut tracker = TransitionTracker::new();
        tracker.observe(GatewayStatus::Stopped);
        assert!(tracker.note_unexpected_exit(100));
        tracker.observe(RUNNING);
        assert_eq!(
            tracker.observe(GatewayStatus::Stopped),
            Some(Transition::Stopped)
        );
    }

    #[test]
    fn exit_after_reported_stop_needs_no_notice() {
        let mut tracker = TransitionTracker::new();
        tracker.observe(RUNNING);
        assert_eq!(
            tracker.observe(GatewayStatus::Stopped),
            Some(Transition::Stopped)
        );

        assert!(!tracker.note_unexpected_exit(100));
    }

    #[test]
    fn exit_of_unseen_process_is_announced() {
        let mut tracker = TransitionTracker::new();
        tracker.observe(RUNNING);
        tracker.observe(GatewayStatus::Stopped);

        // Spawned and gone between two polls.
        assert!(tracker.note_unexpected_exit(200));
    }
}
