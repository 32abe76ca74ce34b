use serde::{Deserialize, Serialize};

// ============================================================================
// Health Check Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub store: String,
    pub subscribers: usize,
    pub uptime_secs: i64,
}

// ============================================================================
// Match Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct MatchQuery {
    /// "scheduled", "live" or "finished"
    pub status: Option<String>,
}

// ============================================================================
// Scheduler Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerStatusResponse {
    pub enabled: bool,
    pub running: bool,
    pub interval_secs: u64,
}
