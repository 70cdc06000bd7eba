mod tls;

pub use tls::TlsInspector;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InspectError {
    #[error("invalid url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("connection failed for {host}: {reason}")]
    Connect { host: String, reason: String },
    #[error("TLS handshake failed for {host}: {reason}")]
    Handshake { host: String, reason: String },
    #[error("no peer certificate presented by {host}")]
    NoCertificate { host: String },
    #[error("could not parse certificate from {host}: {reason}")]
    Parse { host: String, reason: String },
    #[error("timed out inspecting {host}")]
    Timeout { host: String },
}

/// Trait for reading the expiry timestamp of a URL's TLS certificate.
///
/// `Ok(None)` means the URL is not HTTPS and was skipped; errors are
/// per-host and expected to be swallowed and logged by the caller.
#[async_trait]
pub trait CertInspector: Send + Sync {
    async fn expiry(&self, url: &str) -> Result<Option<DateTime<Utc>>, InspectError>;
}
