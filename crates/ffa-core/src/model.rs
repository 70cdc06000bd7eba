use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A monitored URL. Created and edited by the admin collaborator; the worker
/// only touches `last_status_code`, `last_checked_at` and `ssl_expiry`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorRecord {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_id: Option<Uuid>,
    pub url: String,
    pub check_interval_seconds: u32,
    pub is_active: bool,
    pub last_status_code: Option<u16>,
    pub last_checked_at: Option<DateTime<Utc>>,
    pub ssl_expiry: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// One appended uptime fact. Never mutated after insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingRecord {
    pub id: Uuid,
    pub monitor_id: Uuid,
    pub response_time_ms: Option<u64>,
    pub status_code: Option<u16>,
    pub is_up: bool,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insert shape for a ping result.
#[derive(Debug, Clone)]
pub struct NewPingResult {
    pub monitor_id: Uuid,
    pub response_time_ms: Option<u64>,
    pub status_code: Option<u16>,
    pub is_up: bool,
    pub error_message: Option<String>,
}

impl NewPingResult {
    pub fn up(monitor_id: Uuid, status_code: u16, response_time_ms: u64) -> Self {
        Self {
            monitor_id,
            response_time_ms: Some(response_time_ms),
            status_code: Some(status_code),
            is_up: true,
            error_message: None,
        }
    }

    pub fn down(monitor_id: Uuid, error_message: impl Into<String>) -> Self {
        Self {
            monitor_id,
            response_time_ms: None,
            status_code: None,
            is_up: false,
            error_message: Some(error_message.into()),
        }
    }
}

/// A registered application, identified at ingest time by its API key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub id: Uuid,
    pub name: String,
    pub api_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One ingested log line. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    pub id: Uuid,
    pub app_id: Uuid,
    pub level: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,
    pub environment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insert shape for a log record. Defaults for `level` and `environment`
/// are applied by the ingestion endpoint before this is built.
#[derive(Debug, Clone)]
pub struct NewLogRecord {
    pub app_id: Uuid,
    pub level: String,
    pub message: String,
    pub context: Option<serde_json::Value>,
    pub environment: String,
    pub hostname: Option<String>,
}
