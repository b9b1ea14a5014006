//! Direct-mode process management.

pub mod shutdown;
mod supervisor;

pub use supervisor::{DEFAULT_GRACE_PERIOD, ProcessSupervisor, SupervisorConfig};
