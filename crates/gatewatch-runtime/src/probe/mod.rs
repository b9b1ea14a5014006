//! Leaf probes: port holder, HTTP health, session count.

mod health;
mod lsof;
mod sessions;

pub use health::HttpHealthCheck;
pub use lsof::{LsofStatusProbe, parse_holders};
pub use sessions::SessionFileCounter;
