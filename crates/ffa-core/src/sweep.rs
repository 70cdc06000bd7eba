//! One-pass sweeps over the active monitor set.
//!
//! Each monitor is an independent unit of work: probe/handshake failures
//! and per-monitor store errors are converted into recorded data or log
//! lines, never propagated. Only an unavailable store aborts a sweep, and
//! then by skipping the whole tick before any write happens.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::inspect::CertInspector;
use crate::model::{MonitorRecord, NewPingResult};
use crate::probe::UrlProber;
use crate::stats::WorkerStats;
use crate::store::{Store, StoreError};

/// Outcome of one uptime sweep.
#[derive(Debug, Clone, Copy, Default)]
pub struct SweepSummary {
    pub checked: usize,
    pub up: usize,
    pub down: usize,
    /// True when the store was unreachable and the tick was skipped.
    pub skipped: bool,
}

impl SweepSummary {
    fn skipped() -> Self {
        Self {
            skipped: true,
            ..Default::default()
        }
    }
}

/// Outcome of one SSL sweep.
#[derive(Debug, Clone, Copy, Default)]
pub struct SslSummary {
    pub checked: usize,
    pub updated: usize,
    pub skipped: bool,
}

impl SslSummary {
    fn skipped() -> Self {
        Self {
            skipped: true,
            ..Default::default()
        }
    }
}

/// Run one uptime pass: probe every active monitor, append exactly one
/// ping result each, and stamp `last_checked_at`.
pub async fn run_uptime_sweep(
    store: Arc<dyn Store>,
    prober: Arc<dyn UrlProber>,
    concurrency: usize,
    stats: &WorkerStats,
) -> SweepSummary {
    let monitors = match store.active_monitors().await {
        Ok(monitors) => monitors,
        Err(StoreError::Unavailable) => {
            debug!("Store unavailable, skipping uptime sweep");
            WorkerStats::incr(&stats.uptime_sweeps_skipped);
            return SweepSummary::skipped();
        }
        Err(e) => {
            warn!(error = %e, "Failed to fetch monitors, skipping uptime sweep");
            WorkerStats::incr(&stats.uptime_sweeps_skipped);
            return SweepSummary::skipped();
        }
    };

    let checked = monitors.len();
    let probes: Vec<_> = monitors
        .into_iter()
        .map(|monitor| {
            let store = Arc::clone(&store);
            let prober = Arc::clone(&prober);
            async move { check_monitor(&monitor, store.as_ref(), prober.as_ref()).await }
        })
        .collect();

    let results: Vec<bool> = stream::iter(probes)
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let up = results.iter().filter(|is_up| **is_up).count();
    let down = checked - up;

    WorkerStats::incr(&stats.uptime_sweeps);
    stats.pings_up.fetch_add(up as u64, Ordering::Relaxed);
    stats.pings_down.fetch_add(down as u64, Ordering::Relaxed);

    SweepSummary {
        checked,
        up,
        down,
        skipped: false,
    }
}

async fn check_monitor(
    monitor: &MonitorRecord,
    store: &dyn Store,
    prober: &dyn UrlProber,
) -> bool {
    match prober.probe(&monitor.url).await {
        Ok(outcome) => {
            let ping =
                NewPingResult::up(monitor.id, outcome.status_code, outcome.response_time_ms);
            if let Err(e) = store.record_ping(ping).await {
                warn!(monitor_id = %monitor.id, error = %e, "Failed to record ping result");
            }
            if let Err(e) = store
                .mark_checked(monitor.id, Some(outcome.status_code), Utc::now())
                .await
            {
                warn!(monitor_id = %monitor.id, error = %e, "Failed to update monitor");
            }
            true
        }
        Err(probe_err) => {
            debug!(
                monitor_id = %monitor.id,
                url = %monitor.url,
                error = %probe_err,
                "Probe failed"
            );
            let ping = NewPingResult::down(monitor.id, probe_err.to_string());
            if let Err(e) = store.record_ping(ping).await {
                warn!(monitor_id = %monitor.id, error = %e, "Failed to record ping result");
            }
            // Status code stays untouched on failure.
            if let Err(e) = store.mark_checked(monitor.id, None, Utc::now()).await {
                warn!(monitor_id = %monitor.id, error = %e, "Failed to update monitor");
            }
            false
        }
    }
}

/// Run one SSL pass: inspect every active HTTPS monitor and record the
/// observed certificate expiry. Non-HTTPS monitors and per-host failures
/// leave `ssl_expiry` unchanged.
pub async fn run_ssl_sweep(
    store: Arc<dyn Store>,
    inspector: Arc<dyn CertInspector>,
    stats: &WorkerStats,
) -> SslSummary {
    let monitors = match store.active_monitors().await {
        Ok(monitors) => monitors,
        Err(StoreError::Unavailable) => {
            debug!("Store unavailable, skipping SSL sweep");
            return SslSummary::skipped();
        }
        Err(e) => {
            warn!(error = %e, "Failed to fetch monitors, skipping SSL sweep");
            return SslSummary::skipped();
        }
    };

    let mut updated = 0usize;
    for monitor in &monitors {
        match inspector.expiry(&monitor.url).await {
            Ok(Some(expiry)) => match store.set_ssl_expiry(monitor.id, expiry).await {
                Ok(()) => {
                    debug!(monitor_id = %monitor.id, %expiry, "Certificate expiry recorded");
                    updated += 1;
                }
                Err(e) => {
                    warn!(monitor_id = %monitor.id, error = %e, "Failed to store certificate expiry");
                }
            },
            Ok(None) => {}
            Err(e) => {
                debug!(
                    monitor_id = %monitor.id,
                    url = %monitor.url,
                    error = %e,
                    "Certificate check failed"
                );
            }
        }
    }

    WorkerStats::incr(&stats.ssl_sweeps);
    stats.ssl_updates.fetch_add(updated as u64, Ordering::Relaxed);

    SslSummary {
        checked: monitors.len(),
        updated,
        skipped: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use chrono::{DateTime, Duration as ChronoDuration, Utc};
    use std::time::Duration;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::inspect::InspectError;
    use crate::probe::HttpProber;
    use crate::store::MemoryStore;

    fn prober() -> Arc<dyn UrlProber> {
        Arc::new(HttpProber::new(Duration::from_secs(2)))
    }

    async fn server_with_status(status: u16) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn sweep_writes_one_result_per_monitor() {
        let server = server_with_status(200).await;
        let store = Arc::new(MemoryStore::new());
        let a = store.add_monitor(server.uri(), 60);
        let b = store.add_monitor(server.uri(), 60);

        let stats = WorkerStats::new();
        let summary =
            run_uptime_sweep(store.clone(), prober(), 4, &stats).await;

        assert_eq!(summary.checked, 2);
        assert_eq!(summary.up, 2);
        assert_eq!(summary.down, 0);
        assert_eq!(store.ping_history(a.id).len(), 1);
        assert_eq!(store.ping_history(b.id).len(), 1);
    }

    #[tokio::test]
    async fn one_unreachable_monitor_does_not_block_others() {
        let server = server_with_status(200).await;
        let store = Arc::new(MemoryStore::new());
        for _ in 0..4 {
            store.add_monitor(server.uri(), 60);
        }
        let bad = store.add_monitor("http://127.0.0.1:1/", 60);

        let stats = WorkerStats::new();
        let summary =
            run_uptime_sweep(store.clone(), prober(), 4, &stats).await;

        assert_eq!(summary.checked, 5);
        assert_eq!(summary.up, 4);
        assert_eq!(summary.down, 1);
        assert_eq!(store.ping_count(), 5);

        let failed = &store.ping_history(bad.id)[0];
        assert!(!failed.is_up);
        assert!(failed.status_code.is_none());
        assert!(!failed.error_message.as_deref().unwrap_or("").is_empty());
    }

    #[tokio::test]
    async fn error_statuses_still_count_as_up() {
        let server = server_with_status(503).await;
        let store = Arc::new(MemoryStore::new());
        let m = store.add_monitor(server.uri(), 60);

        let stats = WorkerStats::new();
        let summary =
            run_uptime_sweep(store.clone(), prober(), 4, &stats).await;

        assert_eq!(summary.up, 1);
        let ping = &store.ping_history(m.id)[0];
        assert!(ping.is_up);
        assert_eq!(ping.status_code, Some(503));
        assert!(ping.response_time_ms.is_some());
        assert_eq!(store.monitor(m.id).unwrap().last_status_code, Some(503));
    }

    #[tokio::test]
    async fn failed_probe_leaves_status_code_untouched() {
        let store = Arc::new(MemoryStore::new());
        let m = store.add_monitor("http://127.0.0.1:1/", 60);
        store.mark_checked(m.id, Some(200), Utc::now()).await.unwrap();

        let stats = WorkerStats::new();
        run_uptime_sweep(store.clone(), prober(), 4, &stats).await;

        let monitor = store.monitor(m.id).unwrap();
        assert_eq!(monitor.last_status_code, Some(200));
        assert!(monitor.last_checked_at.is_some());
    }

    #[tokio::test]
    async fn unavailable_store_skips_the_whole_tick() {
        let store = Arc::new(MemoryStore::new());
        store.add_monitor("https://a.example", 60);
        store.set_unavailable(true);

        let stats = WorkerStats::new();
        let summary =
            run_uptime_sweep(store.clone(), prober(), 4, &stats).await;

        assert!(summary.skipped);
        store.set_unavailable(false);
        assert_eq!(store.ping_count(), 0);
    }

    #[tokio::test]
    async fn rerunning_the_sweep_appends_a_second_result() {
        let server = server_with_status(200).await;
        let store = Arc::new(MemoryStore::new());
        let m = store.add_monitor(server.uri(), 60);

        let stats = WorkerStats::new();
        run_uptime_sweep(store.clone(), prober(), 4, &stats).await;
        run_uptime_sweep(store.clone(), prober(), 4, &stats).await;

        let history = store.ping_history(m.id);
        assert_eq!(history.len(), 2);
        assert_ne!(history[0].id, history[1].id);
        assert!(history.iter().all(|p| p.is_up));
    }

    struct StaticInspector {
        expiry: DateTime<Utc>,
    }

    #[async_trait]
    impl CertInspector for StaticInspector {
        async fn expiry(&self, url: &str) -> Result<Option<DateTime<Utc>>, InspectError> {
            if url.starts_with("https://") {
                Ok(Some(self.expiry))
            } else {
                Ok(None)
            }
        }
    }

    struct FailingInspector;

    #[async_trait]
    impl CertInspector for FailingInspector {
        async fn expiry(&self, url: &str) -> Result<Option<DateTime<Utc>>, InspectError> {
            if !url.starts_with("https://") {
                return Ok(None);
            }
            Err(InspectError::Timeout {
                host: url.to_string(),
            })
        }
    }

    #[tokio::test]
    async fn ssl_sweep_sets_expiry_for_https_only() {
        let store = Arc::new(MemoryStore::new());
        let https = store.add_monitor("https://secure.example", 60);
        let http = store.add_monitor("http://plain.example", 60);

        let expiry = Utc::now() + ChronoDuration::days(90);
        let inspector = Arc::new(StaticInspector { expiry });

        let stats = WorkerStats::new();
        let summary = run_ssl_sweep(store.clone(), inspector, &stats).await;

        assert_eq!(summary.checked, 2);
        assert_eq!(summary.updated, 1);
        assert_eq!(store.monitor(https.id).unwrap().ssl_expiry, Some(expiry));
        assert!(store.monitor(http.id).unwrap().ssl_expiry.is_none());
    }

    #[tokio::test]
    async fn ssl_failures_leave_expiry_unchanged() {
        let store = Arc::new(MemoryStore::new());
        let m = store.add_monitor("https://secure.example", 60);

        let stats = WorkerStats::new();
        let summary = run_ssl_sweep(store.clone(), Arc::new(FailingInspector), &stats).await;

        assert_eq!(summary.checked, 1);
        assert_eq!(summary.updated, 0);
        assert!(store.monitor(m.id).unwrap().ssl_expiry.is_none());
    }

    #[tokio::test]
    async fn ssl_sweep_skips_when_store_unavailable() {
        let store = Arc::new(MemoryStore::new());
        store.add_monitor("https://secure.example", 60);
        store.set_unavailable(true);

        let stats = WorkerStats::new();
        let summary = run_ssl_sweep(
            store.clone(),
            Arc::new(StaticInspector { expiry: Utc::now() }),
            &stats,
        )
        .await;

        assert!(summary.skipped);
    }
}
