//! Liveness and detail probes.
//!
//! All probes are infallible; failures normalize to `Unknown`, `false` or `0`.

use async_trait::async_trait;

use crate::domain::GatewayStatus;

/// Inspects the well-known port.
#[async_trait]
pub trait StatusProbe: Send + Sync {
    /// Current status of the port holder.
    async fn probe(&self) -> GatewayStatus;

    /// Whether the port is confirmed free. `Unknown` counts as not free.
    async fn port_available(&self) -> bool {
        matches!(self.probe().await, GatewayStatus::Stopped)
    }
}

/// Best-effort HTTP health request used for secondary connectivity.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn check(&self) -> bool;
}

/// Reads the active session count from the gateway's state file.
#[async_trait]
pub trait SessionCounter: Send + Sync {
    async fn count(&self) -> usize;
}
