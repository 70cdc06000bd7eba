use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use super::{Store, StoreError};
use crate::model::{
    ApplicationRecord, LogRecord, MonitorRecord, NewLogRecord, NewPingResult, PingRecord,
};

/// In-memory store.
///
/// Backs the standalone binary and the test suite. The `add_*` helpers
/// stand in for the external CRUD collaborator; `set_unavailable` models a
/// torn-down connection pool so outage paths can be exercised.
#[derive(Debug, Default)]
pub struct MemoryStore {
    monitors: DashMap<Uuid, MonitorRecord>,
    applications: DashMap<Uuid, ApplicationRecord>,
    pings: RwLock<Vec<PingRecord>>,
    logs: RwLock<Vec<LogRecord>>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_monitor(&self, url: impl Into<String>, check_interval_seconds: u32) -> MonitorRecord {
        let record = MonitorRecord {
            id: Uuid::new_v4(),
            app_id: None,
            url: url.into(),
            check_interval_seconds,
            is_active: true,
            last_status_code: None,
            last_checked_at: None,
            ssl_expiry: None,
            created_at: Utc::now(),
        };
        self.monitors.insert(record.id, record.clone());
        record
    }

    pub fn add_application(
        &self,
        name: impl Into<String>,
        api_key: impl Into<String>,
        webhook_url: Option<String>,
    ) -> ApplicationRecord {
        let record = ApplicationRecord {
            id: Uuid::new_v4(),
            name: name.into(),
            api_key: api_key.into(),
            webhook_url,
            created_at: Utc::now(),
        };
        self.applications.insert(record.id, record.clone());
        record
    }

    pub fn set_active(&self, monitor_id: Uuid, active: bool) {
        if let Some(mut m) = self.monitors.get_mut(&monitor_id) {
            m.is_active = active;
        }
    }

    pub fn monitor(&self, monitor_id: Uuid) -> Option<MonitorRecord> {
        self.monitors.get(&monitor_id).map(|m| m.value().clone())
    }

    pub fn ping_history(&self, monitor_id: Uuid) -> Vec<PingRecord> {
        self.pings
            .read()
            .expect("ping lock poisoned")
            .iter()
            .filter(|p| p.monitor_id == monitor_id)
            .cloned()
            .collect()
    }

    pub fn ping_count(&self) -> usize {
        self.pings.read().expect("ping lock poisoned").len()
    }

    pub fn logs(&self) -> Vec<LogRecord> {
        self.logs.read().expect("log lock poisoned").clone()
    }

    pub fn monitor_count(&self) -> usize {
        self.monitors.len()
    }

    /// Simulate pool teardown (`true`) / rebuild (`false`).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn active_monitors(&self) -> Result<Vec<MonitorRecord>, StoreError> {
        self.check_available()?;
        Ok(self
            .monitors
            .iter()
            .filter(|m| m.is_active)
            .map(|m| m.value().clone())
            .collect())
    }

    async fn record_ping(&self, ping: NewPingResult) -> Result<(), StoreError> {
        self.check_available()?;
        if !self.monitors.contains_key(&ping.monitor_id) {
            return Err(StoreError::query(format!(
                "unknown monitor {}",
                ping.monitor_id
            )));
        }
        let record = PingRecord {
            id: Uuid::new_v4(),
            monitor_id: ping.monitor_id,
            response_time_ms: ping.response_time_ms,
            status_code: ping.status_code,
            is_up: ping.is_up,
            error_message: ping.error_message,
            created_at: Utc::now(),
        };
        self.pings.write().expect("ping lock poisoned").push(record);
        Ok(())
    }

    async fn mark_checked(
        &self,
        monitor_id: Uuid,
        status_code: Option<u16>,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.check_available()?;
        let mut monitor = self
            .monitors
            .get_mut(&monitor_id)
            .ok_or_else(|| StoreError::query(format!("unknown monitor {monitor_id}")))?;
        monitor.last_checked_at = Some(at);
        if let Some(code) = status_code {
            monitor.last_status_code = Some(code);
        }
        Ok(())
    }

    async fn set_ssl_expiry(
        &self,
        monitor_id: Uuid,
        expiry: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.check_available()?;
        let mut monitor = self
            .monitors
            .get_mut(&monitor_id)
            .ok_or_else(|| StoreError::query(format!("unknown monitor {monitor_id}")))?;
        monitor.ssl_expiry = Some(expiry);
        Ok(())
    }

    async fn application_by_key(
        &self,
        api_key: &str,
    ) -> Result<Option<ApplicationRecord>, StoreError> {
        self.check_available()?;
        Ok(self
            .applications
            .iter()
            .find(|a| a.api_key == api_key)
            .map(|a| a.value().clone()))
    }

    async fn insert_log(&self, log: NewLogRecord) -> Result<(), StoreError> {
        self.check_available()?;
        if !self.applications.contains_key(&log.app_id) {
            return Err(StoreError::query(format!("unknown application {}", log.app_id)));
        }
        let record = LogRecord {
            id: Uuid::new_v4(),
            app_id: log.app_id,
            level: log.level,
            message: log.message,
            context: log.context,
            environment: log.environment,
            hostname: log.hostname,
            created_at: Utc::now(),
        };
        self.logs.write().expect("log lock poisoned").push(record);
        Ok(())
    }
}
