//! Locating the JavaScript runtime, the gateway entry artifact and a
//! package manager on the host.
//!
//! Every lookup returns a [`Resolution`] carrying the candidates it checked,
//! so `gatewatch paths` can explain why something was not found.

mod env;
mod fs;
mod global_root;
mod resolve;
mod search;
mod types;
mod version;

pub use env::{EnvProvider, SystemEnv};
pub use fs::{FsProvider, SystemFs};
pub use global_root::{GlobalRootProvider, NpmGlobalRoot};
pub use resolve::{GatewayPathResolver, PACKAGE_MANAGERS};
pub use types::{Attempt, AttemptOutcome, Resolution};
pub use version::{compare_versions, parse_version, sort_versions_desc};
