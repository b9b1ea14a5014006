//! Supervision services built purely on ports.

mod controller;
mod polling;
mod transition;
mod update;

#[cfg(test)]
pub(crate) mod test_support;

pub use controller::{ControllerConfig, ControllerDeps, GatewayController};
pub use polling::{PollOutcome, PollingConfig, PollingScheduler, RefreshCycle};
pub use transition::{Transition, TransitionTracker};
pub use update::{UpdateConfig, UpdateError, UpdateOrchestrator, UpdateOutcome};
