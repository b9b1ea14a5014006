//! Terminating the gateway process.
//!
//! - `shutdown_child`: the supervisor owns a `Child` handle and reaps it
//! - `kill_pid` / `force_kill_pid`: only a PID is known, typically the port
//!   holder found by the probe after the supervisor itself was restarted

mod child;
mod pid;

pub use child::shutdown_child;
pub use pid::{force_kill_pid, kill_pid};
