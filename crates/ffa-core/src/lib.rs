#![forbid(unsafe_code)]

pub mod config;
pub mod inspect;
pub mod model;
pub mod probe;
pub mod scheduler;
pub mod stats;
pub mod store;
pub mod sweep;

pub use config::WorkerConfig;
pub use inspect::{CertInspector, InspectError, TlsInspector};
pub use model::{
    ApplicationRecord, LogRecord, MonitorRecord, NewLogRecord, NewPingResult, PingRecord,
};
pub use probe::{HttpProber, ProbeError, ProbeSuccess, UrlProber};
pub use scheduler::{Scheduler, WorkerState};
pub use stats::WorkerStats;
pub use store::{MemoryStore, Store, StoreError};
pub use sweep::{run_ssl_sweep, run_uptime_sweep, SslSummary, SweepSummary};
