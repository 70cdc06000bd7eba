//! Periodic driver for the uptime and SSL sweeps.
//!
//! One scheduler instance owns two background tokio tasks: a fine-grained
//! uptime tick and a daily SSL tick anchored to a wall-clock hour. The
//! scheduler is constructed once and explicitly started; there is no
//! ambient global state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::config::WorkerConfig;
use crate::inspect::{CertInspector, TlsInspector};
use crate::probe::{HttpProber, UrlProber};
use crate::stats::WorkerStats;
use crate::store::Store;
use crate::sweep::{run_ssl_sweep, run_uptime_sweep, SslSummary, SweepSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    Idle,
    Active,
    Stopping,
    Stopped,
}

impl WorkerState {
    pub fn can_transition_to(self, target: WorkerState) -> bool {
        matches!(
            (self, target),
            (WorkerState::Idle, WorkerState::Active)
                | (WorkerState::Active, WorkerState::Stopping)
                | (WorkerState::Stopping, WorkerState::Stopped)
                | (WorkerState::Stopped, WorkerState::Active)
        )
    }
}

impl std::fmt::Display for WorkerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Active => write!(f, "active"),
            Self::Stopping => write!(f, "stopping"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

pub struct Scheduler {
    store: Arc<dyn Store>,
    prober: Arc<dyn UrlProber>,
    inspector: Arc<dyn CertInspector>,
    config: WorkerConfig,
    stats: Arc<WorkerStats>,
    state: Arc<RwLock<WorkerState>>,
    uptime_in_flight: Arc<AtomicBool>,
}

impl Scheduler {
    pub fn new(store: Arc<dyn Store>, config: WorkerConfig) -> Self {
        let prober: Arc<dyn UrlProber> = Arc::new(HttpProber::from_config(&config));
        let inspector: Arc<dyn CertInspector> = Arc::new(TlsInspector::from_config(&config));
        Self {
            store,
            prober,
            inspector,
            config,
            stats: Arc::new(WorkerStats::new()),
            state: Arc::new(RwLock::new(WorkerState::Idle)),
            uptime_in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_prober(mut self, prober: Arc<dyn UrlProber>) -> Self {
        self.prober = prober;
        self
    }

    pub fn with_inspector(mut self, inspector: Arc<dyn CertInspector>) -> Self {
        self.inspector = inspector;
        self
    }

    pub fn with_stats(mut self, stats: Arc<WorkerStats>) -> Self {
        self.stats = stats;
        self
    }

    pub fn stats(&self) -> Arc<WorkerStats> {
        Arc::clone(&self.stats)
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    /// Arm both periodic tasks. Calling `start` on an already-active
    /// scheduler is a no-op.
    pub async fn start(&self) {
        {
            let mut state = self.state.write().await;
            if *state == WorkerState::Active {
                return;
            }
            *state = WorkerState::Active;
        }

        info!(
            ping_interval_secs = self.config.ping_interval.as_secs(),
            ssl_check_hour = self.config.ssl_check_hour,
            "Starting monitoring worker"
        );

        self.spawn_uptime_loop();
        self.spawn_ssl_loop();
    }

    /// Request shutdown. Loops observe the state at their next wake-up and
    /// exit; in-flight probes finish or are cut off by their own timeout.
    pub async fn stop(&self) {
        let mut state = self.state.write().await;
        if *state == WorkerState::Active {
            *state = WorkerState::Stopping;
            info!("Stopping monitoring worker");
        }
    }

    /// Run a single uptime sweep outside the periodic schedule.
    pub async fn run_uptime_once(&self) -> SweepSummary {
        run_uptime_sweep(
            Arc::clone(&self.store),
            Arc::clone(&self.prober),
            self.config.max_concurrent_probes,
            self.stats.as_ref(),
        )
        .await
    }

    /// Run a single SSL sweep outside the periodic schedule.
    pub async fn run_ssl_once(&self) -> SslSummary {
        run_ssl_sweep(
            Arc::clone(&self.store),
            Arc::clone(&self.inspector),
            self.stats.as_ref(),
        )
        .await
    }

    fn spawn_uptime_loop(&self) {
        let state = Arc::clone(&self.state);
        let store = Arc::clone(&self.store);
        let prober = Arc::clone(&self.prober);
        let stats = Arc::clone(&self.stats);
        let in_flight = Arc::clone(&self.uptime_in_flight);
        let interval = self.config.ping_interval;
        let concurrency = self.config.max_concurrent_probes;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                {
                    let current = *state.read().await;
                    if current != WorkerState::Active {
                        // The uptime loop owns the Stopping -> Stopped edge.
                        let mut s = state.write().await;
                        *s = WorkerState::Stopped;
                        info!("Uptime loop stopped");
                        break;
                    }
                }

                // Skip the tick if the previous sweep is still running.
                if in_flight.swap(true, Ordering::SeqCst) {
                    debug!("Previous uptime sweep still in flight, skipping tick");
                    WorkerStats::incr(&stats.uptime_sweeps_skipped);
                    continue;
                }

                let store = Arc::clone(&store);
                let prober = Arc::clone(&prober);
                let stats = Arc::clone(&stats);
                let in_flight = Arc::clone(&in_flight);

                tokio::spawn(async move {
                    let summary =
                        run_uptime_sweep(store, prober, concurrency, stats.as_ref()).await;
                    if !summary.skipped {
                        info!(
                            checked = summary.checked,
                            up = summary.up,
                            down = summary.down,
                            "Uptime sweep complete"
                        );
                    }
                    in_flight.store(false, Ordering::SeqCst);
                });
            }
        });
    }

    fn spawn_ssl_loop(&self) {
        let state = Arc::clone(&self.state);
        let store = Arc::clone(&self.store);
        let inspector = Arc::clone(&self.inspector);
        let stats = Arc::clone(&self.stats);
        let hour = self.config.ssl_check_hour;

        tokio::spawn(async move {
            loop {
                let wait = duration_until_hour(Utc::now(), hour);
                debug!(wait_secs = wait.as_secs(), "Next SSL sweep scheduled");
                tokio::time::sleep(wait).await;

                if *state.read().await != WorkerState::Active {
                    debug!("SSL loop exiting");
                    break;
                }

                let summary = run_ssl_sweep(
                    Arc::clone(&store),
                    Arc::clone(&inspector),
                    stats.as_ref(),
                )
                .await;
                if !summary.skipped {
                    info!(
                        checked = summary.checked,
                        updated = summary.updated,
                        "SSL sweep complete"
                    );
                }
            }
        });
    }
}

/// Time until the next occurrence of `hour:00:00` UTC, strictly in the
/// future so a sweep finishing within the target hour reschedules for the
/// next day.
fn duration_until_hour(now: DateTime<Utc>, hour: u32) -> Duration {
    // Clamp rather than trust the caller; 24+ would make and_hms_opt fail.
    let Some(today) = now.date_naive().and_hms_opt(hour.min(23), 0, 0) else {
        return Duration::from_secs(24 * 3600);
    };
    let today = today.and_utc();
    let target = if today <= now {
        today + chrono::Duration::days(1)
    } else {
        today
    };
    (target - now).to_std().unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use chrono::TimeZone;

    use crate::probe::{ProbeError, ProbeSuccess};
    use crate::store::MemoryStore;

    #[test]
    fn valid_state_transitions() {
        assert!(WorkerState::Idle.can_transition_to(WorkerState::Active));
        assert!(WorkerState::Active.can_transition_to(WorkerState::Stopping));
        assert!(WorkerState::Stopping.can_transition_to(WorkerState::Stopped));
        assert!(WorkerState::Stopped.can_transition_to(WorkerState::Active));
    }

    #[test]
    fn invalid_state_transitions() {
        assert!(!WorkerState::Idle.can_transition_to(WorkerState::Stopped));
        assert!(!WorkerState::Active.can_transition_to(WorkerState::Active));
        assert!(!WorkerState::Stopped.can_transition_to(WorkerState::Stopping));
    }

    #[test]
    fn duration_until_hour_is_strictly_future() {
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 3, 0, 0).unwrap();
        let wait = duration_until_hour(now, 3);
        assert_eq!(wait, Duration::from_secs(24 * 3600));
    }

    #[test]
    fn duration_until_hour_later_today() {
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 1, 30, 0).unwrap();
        let wait = duration_until_hour(now, 3);
        assert_eq!(wait, Duration::from_secs(90 * 60));
    }

    #[test]
    fn duration_until_hour_wraps_to_tomorrow() {
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 22, 0, 0).unwrap();
        let wait = duration_until_hour(now, 3);
        assert_eq!(wait, Duration::from_secs(5 * 3600));
    }

    struct InstantProber;

    #[async_trait]
    impl UrlProber for InstantProber {
        async fn probe(&self, _url: &str) -> Result<ProbeSuccess, ProbeError> {
            Ok(ProbeSuccess {
                status_code: 200,
                response_time_ms: 1,
            })
        }
    }

    struct SlowProber {
        delay: Duration,
    }

    #[async_trait]
    impl UrlProber for SlowProber {
        async fn probe(&self, _url: &str) -> Result<ProbeSuccess, ProbeError> {
            tokio::time::sleep(self.delay).await;
            Ok(ProbeSuccess {
                status_code: 200,
                response_time_ms: self.delay.as_millis() as u64,
            })
        }
    }

    fn scheduler_with(
        store: Arc<MemoryStore>,
        prober: Arc<dyn UrlProber>,
        interval: Duration,
    ) -> Scheduler {
        let config = WorkerConfig::default().with_ping_interval(interval);
        Scheduler::new(store, config).with_prober(prober)
    }

    #[tokio::test]
    async fn start_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let m = store.add_monitor("https://a.example", 60);

        // Hour-long interval: only the immediate first tick fires.
        let scheduler = scheduler_with(
            store.clone(),
            Arc::new(InstantProber),
            Duration::from_secs(3600),
        );
        scheduler.start().await;
        scheduler.start().await;

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(scheduler.state().await, WorkerState::Active);
        // A second loop would have produced a second immediate sweep.
        assert_eq!(store.ping_history(m.id).len(), 1);
    }

    #[tokio::test]
    async fn stop_transitions_to_stopped_at_next_tick() {
        let store = Arc::new(MemoryStore::new());
        store.add_monitor("https://a.example", 60);

        let scheduler = scheduler_with(
            store.clone(),
            Arc::new(InstantProber),
            Duration::from_millis(30),
        );
        scheduler.start().await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        scheduler.stop().await;
        tokio::time::sleep(Duration::from_millis(80)).await;

        assert_eq!(scheduler.state().await, WorkerState::Stopped);
    }

    #[tokio::test]
    async fn overlapping_ticks_are_skipped() {
        let store = Arc::new(MemoryStore::new());
        store.add_monitor("https://a.example", 60);

        let scheduler = scheduler_with(
            store.clone(),
            Arc::new(SlowProber {
                delay: Duration::from_millis(300),
            }),
            Duration::from_millis(40),
        );
        scheduler.start().await;
        tokio::time::sleep(Duration::from_millis(250)).await;
        scheduler.stop().await;

        let stats = scheduler.stats();
        assert!(WorkerStats::get(&stats.uptime_sweeps_skipped) > 0);
        // The first sweep is still the only one that reached the store.
        assert!(store.ping_count() <= 1);
    }

    #[tokio::test]
    async fn run_once_helpers_reuse_the_seams() {
        let store = Arc::new(MemoryStore::new());
        let m = store.add_monitor("https://a.example", 60);

        let scheduler = scheduler_with(
            store.clone(),
            Arc::new(InstantProber),
            Duration::from_secs(3600),
        );
        let summary = scheduler.run_uptime_once().await;

        assert_eq!(summary.checked, 1);
        assert_eq!(summary.up, 1);
        assert_eq!(store.ping_history(m.id).len(), 1);
    }
}
