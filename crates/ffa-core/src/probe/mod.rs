mod http;

pub use http::HttpProber;

use async_trait::async_trait;
use thiserror::Error;

/// A completed probe: the target answered with *some* HTTP status within
/// the timeout. 4xx/5xx still count — the host is up and responding.
#[derive(Debug, Clone, Copy)]
pub struct ProbeSuccess {
    pub status_code: u16,
    pub response_time_ms: u64,
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("timed out after {timeout_ms}ms: {url}")]
    Timeout { url: String, timeout_ms: u64 },
    #[error("connection failed for {url}: {reason}")]
    Connect { url: String, reason: String },
    #[error("request failed for {url}: {reason}")]
    Network { url: String, reason: String },
}

/// Trait for issuing one bounded uptime probe against a URL.
///
/// Implementations make exactly one attempt per call — retry policy belongs
/// to the sweep cadence, not the prober. Object-safe and Send + Sync for
/// use across async tasks.
#[async_trait]
pub trait UrlProber: Send + Sync {
    async fn probe(&self, url: &str) -> Result<ProbeSuccess, ProbeError>;
}
