//! TOML configuration file schema and parsing.
//!
//! Example config file:
//!
//! ```toml
//! [server]
//! listen = "0.0.0.0:8080"
//! log_format = "json"
//!
//! [worker]
//! ping_interval_secs = 60
//! ping_timeout_secs = 10
//! ssl_check_hour = 3
//!
//! [[monitor]]
//! url = "https://api.example.com/health"
//! interval_secs = 60
//!
//! [[application]]
//! name = "billing"
//! api_key = "ffa_live_abc123"
//! webhook_url = "https://hooks.example.com/billing"
//! ```

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use ffa_core::{MemoryStore, WorkerConfig};

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub worker: WorkerDefaults,

    #[serde(default)]
    pub monitor: Vec<MonitorDef>,

    #[serde(default)]
    pub application: Vec<ApplicationDef>,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, String> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {}", path.display(), e))?;
        toml::from_str(&raw)
            .map_err(|e| format!("Failed to parse config file {}: {}", path.display(), e))
    }

    /// Seed the in-memory store with the configured monitors and
    /// applications. These tables stand in for the admin CRUD surface.
    pub fn seed(&self, store: &MemoryStore) {
        for m in &self.monitor {
            let record = store.add_monitor(&m.url, m.interval_secs);
            if !m.active {
                store.set_active(record.id, false);
            }
        }
        for a in &self.application {
            store.add_application(&a.name, &a.api_key, a.webhook_url.clone());
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,

    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            log_format: default_log_format(),
        }
    }
}

fn default_listen() -> SocketAddr {
    "0.0.0.0:8080".parse().unwrap()
}

fn default_log_format() -> String {
    "pretty".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkerDefaults {
    #[serde(default = "default_ping_interval_secs")]
    pub ping_interval_secs: u64,

    #[serde(default = "default_ping_timeout_secs")]
    pub ping_timeout_secs: u64,

    #[serde(default = "default_ssl_check_hour")]
    pub ssl_check_hour: u32,

    #[serde(default = "default_ssl_timeout_secs")]
    pub ssl_timeout_secs: u64,

    #[serde(default = "default_max_concurrent_probes")]
    pub max_concurrent_probes: usize,
}

impl Default for WorkerDefaults {
    fn default() -> Self {
        Self {
            ping_interval_secs: default_ping_interval_secs(),
            ping_timeout_secs: default_ping_timeout_secs(),
            ssl_check_hour: default_ssl_check_hour(),
            ssl_timeout_secs: default_ssl_timeout_secs(),
            max_concurrent_probes: default_max_concurrent_probes(),
        }
    }
}

fn default_ping_interval_secs() -> u64 {
    60
}

fn default_ping_timeout_secs() -> u64 {
    10
}

fn default_ssl_check_hour() -> u32 {
    3
}

fn default_ssl_timeout_secs() -> u64 {
    5
}

fn default_max_concurrent_probes() -> usize {
    8
}

impl WorkerDefaults {
    pub fn to_worker_config(&self) -> WorkerConfig {
        WorkerConfig::default()
            .with_ping_interval(Duration::from_secs(self.ping_interval_secs))
            .with_ping_timeout(Duration::from_secs(self.ping_timeout_secs))
            .with_ssl_check_hour(self.ssl_check_hour)
            .with_ssl_timeout(Duration::from_secs(self.ssl_timeout_secs))
            .with_max_concurrent_probes(self.max_concurrent_probes)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitorDef {
    pub url: String,

    #[serde(default = "default_ping_interval_secs_u32")]
    pub interval_secs: u32,

    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_ping_interval_secs_u32() -> u32 {
    60
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationDef {
    pub name: String,
    pub api_key: String,

    #[serde(default)]
    pub webhook_url: Option<String>,
}
