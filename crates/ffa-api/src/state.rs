use std::sync::Arc;

use ffa_core::{Store, WorkerStats};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub stats: Arc<WorkerStats>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            stats: Arc::new(WorkerStats::new()),
        }
    }

    pub fn with_stats(mut self, stats: Arc<WorkerStats>) -> Self {
        self.stats = stats;
        self
    }
}
