use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::broadcast::HubHandle;
use crate::persistence::MatchStore;
use crate::scheduler::Scheduler;

/// Shared application state for API handlers
#[derive(Clone)]
pub struct AppState {
    /// System of record for matches
    pub store: Arc<dyn MatchStore>,

    /// Fan-out hub; each WebSocket registers one subscriber
    pub hub: HubHandle,

    /// Scrape scheduler, when one is configured
    pub scheduler: Option<Arc<Scheduler>>,

    /// Application start time
    pub start_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(store: Arc<dyn MatchStore>, hub: HubHandle) -> Self {
        Self {
            store,
            hub,
            scheduler: None,
            start_time: Utc::now(),
        }
    }

    pub fn with_scheduler(mut self, scheduler: Arc<Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.start_time).num_seconds()
    }
}
