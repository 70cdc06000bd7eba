mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::model::{ApplicationRecord, MonitorRecord, NewLogRecord, NewPingResult};

#[derive(Debug, Error)]
pub enum StoreError {
    /// The store is not reachable at all (no pool configured, connection
    /// down). Sweeps skip the whole tick on this; ingestion returns 503.
    #[error("store unavailable")]
    Unavailable,
    #[error("store query failed: {reason}")]
    Query { reason: String },
}

impl StoreError {
    pub fn query(reason: impl Into<String>) -> Self {
        Self::Query {
            reason: reason.into(),
        }
    }
}

/// Narrow contract onto the system of record.
///
/// The surrounding product owns monitor/application CRUD; the worker and
/// the ingestion endpoint only need the operations below. Implementations
/// must tolerate many concurrent short-lived calls — no call spans more
/// than a single write.
#[async_trait]
pub trait Store: Send + Sync {
    /// All monitors with `is_active = true`, eligible for sweeps.
    async fn active_monitors(&self) -> Result<Vec<MonitorRecord>, StoreError>;

    /// Append one ping result. Never updates an existing row.
    async fn record_ping(&self, ping: NewPingResult) -> Result<(), StoreError>;

    /// Update `last_checked_at`, and `last_status_code` only when a status
    /// code is given (failed probes leave the previous status in place).
    async fn mark_checked(
        &self,
        monitor_id: Uuid,
        status_code: Option<u16>,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Set the certificate expiry observed by the SSL sweep.
    async fn set_ssl_expiry(
        &self,
        monitor_id: Uuid,
        expiry: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Resolve an API key to an application, if any.
    async fn application_by_key(
        &self,
        api_key: &str,
    ) -> Result<Option<ApplicationRecord>, StoreError>;

    /// Append one log record.
    async fn insert_log(&self, log: NewLogRecord) -> Result<(), StoreError>;
}
