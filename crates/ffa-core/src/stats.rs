use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide worker counters, shared between the scheduler, the sweeps
/// and the metrics endpoint. All counters are monotonic.
#[derive(Debug, Default)]
pub struct WorkerStats {
    pub uptime_sweeps: AtomicU64,
    pub uptime_sweeps_skipped: AtomicU64,
    pub pings_up: AtomicU64,
    pub pings_down: AtomicU64,
    pub ssl_sweeps: AtomicU64,
    pub ssl_updates: AtomicU64,
    pub logs_accepted: AtomicU64,
    pub logs_dropped: AtomicU64,
}

impl WorkerStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(counter: &AtomicU64) -> u64 {
        counter.load(Ordering::Relaxed)
    }
}
