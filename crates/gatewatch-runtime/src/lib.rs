//! OS adapters for the gateway supervisor: port and health probes, the
//! layered path resolver, the direct process supervisor, the launchd service
//! manager, and the backends built on top of them.

#![deny(unsafe_code)]

pub mod backends;
mod command;
mod notifier;
pub mod probe;
pub mod process;
pub mod resolver;
pub mod service;
mod settings_store;

// Re-export the two lifecycle backends
pub use backends::{DirectBackend, ManagedServiceBackend};

// Re-export external-tool execution
pub use command::TokioCommandRunner;

// Re-export leaf probes
pub use probe::{HttpHealthCheck, LsofStatusProbe, SessionFileCounter};

// Re-export process and service management
pub use process::{ProcessSupervisor, SupervisorConfig};
pub use service::{LaunchdServiceManager, ServiceConfig, ServiceDescriptor, ServiceError};

// Re-export path resolution
pub use resolver::{GatewayPathResolver, Resolution};

pub use notifier::TracingNotifier;
pub use settings_store::JsonSettingsStore;
