use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the monitoring worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Interval between uptime sweeps (default: 60s).
    pub ping_interval: Duration,
    /// HTTP request timeout for a single probe.
    pub ping_timeout: Duration,
    /// Wall-clock hour (UTC) at which the daily SSL sweep runs.
    pub ssl_check_hour: u32,
    /// Timeout covering TCP connect plus TLS handshake for one host.
    pub ssl_timeout: Duration,
    /// Maximum number of monitors probed concurrently within one sweep.
    pub max_concurrent_probes: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            ping_interval: Duration::from_secs(60),
            ping_timeout: Duration::from_secs(10),
            ssl_check_hour: 3,
            ssl_timeout: Duration::from_secs(5),
            max_concurrent_probes: 8,
        }
    }
}

impl WorkerConfig {
    pub fn with_ping_interval(mut self, interval: Duration) -> Self {
        self.ping_interval = interval;
        self
    }

    pub fn with_ping_timeout(mut self, timeout: Duration) -> Self {
        self.ping_timeout = timeout;
        self
    }

    pub fn with_ssl_check_hour(mut self, hour: u32) -> Self {
        self.ssl_check_hour = hour.min(23);
        self
    }

    pub fn with_ssl_timeout(mut self, timeout: Duration) -> Self {
        self.ssl_timeout = timeout;
        self
    }

    pub fn with_max_concurrent_probes(mut self, max: usize) -> Self {
        self.max_concurrent_probes = max.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_worker_contract() {
        let c = WorkerConfig::default();
        assert_eq!(c.ping_interval, Duration::from_secs(60));
        assert_eq!(c.ping_timeout, Duration::from_secs(10));
        assert_eq!(c.ssl_check_hour, 3);
        assert_eq!(c.ssl_timeout, Duration::from_secs(5));
    }

    #[test]
    fn ssl_check_hour_is_clamped() {
        let c = WorkerConfig::default().with_ssl_check_hour(99);
        assert_eq!(c.ssl_check_hour, 23);
    }

    #[test]
    fn concurrency_floor_is_one() {
        let c = WorkerConfig::default().with_max_concurrent_probes(0);
        assert_eq!(c.max_concurrent_probes, 1);
    }
}
