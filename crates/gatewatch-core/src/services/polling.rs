//! Background and adaptive polling.
//!
//! Two independent timers drive the refresh cycle:
//! - a slow background timer that runs for the lifetime of the process
//! - a short-lived adaptive session armed after state-changing commands,
//!   converging on an expected status or giving up at a fixed ceiling
//!
//! At most one adaptive session is active; arming a new one cancels the
//! previous session.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::domain::{GatewayStatus, PollTarget};

/// One full refresh of published state.
#[async_trait]
pub trait RefreshCycle: Send + Sync {
    async fn refresh(&self) -> GatewayStatus;
}

/// Timer settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingConfig {
    pub background_period: Duration,
    pub session_tick: Duration,
    pub session_ceiling: Duration,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            background_period: Duration::from_secs(30),
            session_tick: Duration::from_secs(1),
            session_ceiling: Duration::from_secs(30),
        }
    }
}

/// How an adaptive session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Observed status matched the target.
    Converged,
    /// The ceiling elapsed first.
    TimedOut,
    /// A newer session replaced this one.
    Superseded,
}

struct ActiveSession {
    id: u64,
    cancel: CancellationToken,
}

pub struct PollingScheduler {
    config: PollingConfig,
    active: Arc<Mutex<Option<ActiveSession>>>,
    next_id: AtomicU64,
}

impl PollingScheduler {
    pub fn new(config: PollingConfig) -> Self {
        Self {
            config,
            active: Arc::new(Mutex::new(None)),
            next_id: AtomicU64::new(1),
        }
    }

    /// Run `cycle` every background period until `shutdown` fires.
    ///
    /// The first refresh happens immediately.
    pub fn spawn_background(
        &self,
        cycle: Arc<dyn RefreshCycle>,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        let period = self.config.background_period;

        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    () = shutdown.cancelled() => {
                        debug!("Background polling stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        let status = cycle.refresh().await;
                        debug!(%status, "Background refresh");
                    }
                }
            }
        })
    }

    /// Arm an adaptive session for `target`, superseding any active one.
    pub fn arm(&self, cycle: Arc<dyn RefreshCycle>, target: PollTarget) -> JoinHandle<PollOutcome> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();

        {
            let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(previous) = active.replace(ActiveSession {
                id,
                cancel: cancel.clone(),
            }) {
                debug!(superseded = previous.id, session = id, "Superseding poll session");
                previous.cancel.cancel();
            }
        }

        let active = Arc::clone(&self.active);
        let config = self.config;

        tokio::spawn(async move {
            let outcome = run_session(cycle.as_ref(), target, config, &cancel).await;

            let mut active = active.lock().unwrap_or_else(PoisonError::into_inner);
            if active.as_ref().is_some_and(|s| s.id == id) {
                *active = None;
            }
            debug!(session = id, ?target, ?outcome, "Poll session finished");
            outcome
        })
    }

    /// Whether an adaptive session is in flight.
    pub fn is_session_active(&self) -> bool {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

async fn run_session(
    cycle: &dyn RefreshCycle,
    target: PollTarget,
    config: PollingConfig,
    cancel: &CancellationToken,
) -> PollOutcome {
    let start = Instant::now();
    let deadline = start + config.session_ceiling;
    let mut ticker = interval_at(start + config.session_tick, config.session_tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return PollOutcome::Superseded,
            _ = ticker.tick() => {}
        }

        let status = cycle.refresh().await;

        if cancel.is_cancelled() {
            return PollOutcome::Superseded;
        }
        if target.is_reached_by(&status) {
            return PollOutcome::Converged;
        }
        if Instant::now() >= deadline {
            return PollOutcome::TimedOut;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;

    use super::*;

    /// Replays scripted statuses, repeating the last one forever.
    struct ScriptedCycle {
        script: Mutex<VecDeque<GatewayStatus>>,
        last: Mutex<GatewayStatus>,
        calls: AtomicUsize,
    }

    impl ScriptedCycle {
        fn new(script: &[GatewayStatus]) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.iter().copied().collect()),
                last: Mutex::new(GatewayStatus::Unknown),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RefreshCycle for ScriptedCycle {
        async fn refresh(&self) -> GatewayStatus {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut last = self.last.lock().unwrap();
            if let Some(next) = self.script.lock().unwrap().pop_front() {
                *last = next;
            }
            *last
        }
    }

    #[tokio::test(start_paused = true)]
    async fn session_converges_on_target() {
        let scheduler = PollingScheduler::new(PollingConfig::default());
        let cycle = ScriptedCycle::new(&[
            GatewayStatus::Stopped,
            GatewayStatus::Unknown,
            GatewayStatus::Running { pid: 9 },
        ]);
        let started = Instant::now();

        let outcome = scheduler
            .arm(cycle.clone(), PollTarget::Running)
            .await
            .unwrap();

        assert_eq!(outcome, PollOutcome::Converged);
        assert_eq!(cycle.calls(), 3);
        assert_eq!(started.elapsed(), Duration::from_secs(3));
        assert!(!scheduler.is_session_active());
    }

    #[tokio::test(start_paused = true)]
    async fn session_stops_exactly_at_ceiling() {
        let scheduler = PollingScheduler::new(PollingConfig::default());
        let cycle = ScriptedCycle::new(&[GatewayStatus::Stopped]);
        let started = Instant::now();

        let outcome = scheduler
            .arm(cycle.clone(), PollTarget::Running)
            .await
            .unwrap();

        assert_eq!(outcome, PollOutcome::TimedOut);
        assert_eq!(cycle.calls(), 30);
        assert_eq!(started.elapsed(), Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn arming_supersedes_previous_session() {
        let scheduler = PollingScheduler::new(PollingConfig::default());
        let cycle = ScriptedCycle::new(&[GatewayStatus::Stopped]);

        let first = scheduler.arm(cycle.clone(), PollTarget::Running);
        let second = scheduler.arm(cycle.clone(), PollTarget::Stopped);

        assert_eq!(first.await.unwrap(), PollOutcome::Superseded);
        assert_eq!(second.await.unwrap(), PollOutcome::Converged);
        assert!(!scheduler.is_session_active());
    }

    #[tokio::test(start_paused = true)]
    async fn background_polls_every_period_until_shutdown() {
        let scheduler = PollingScheduler::new(PollingConfig::default());
        let cycle = ScriptedCycle::new(&[GatewayStatus::Stopped]);
        let shutdown = CancellationToken::new();

        let handle = scheduler.spawn_background(cycle.clone(), shutdown.clone());
        tokio::time::sleep(Duration::from_secs(95)).await;
        shutdown.cancel();
        handle.await.unwrap();

        // t = 0, 30, 60, 90
        assert_eq!(cycle.calls(), 4);
    }
}
