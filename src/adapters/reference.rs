//! Reference data: player rankings and the tournament calendar

use async_trait::async_trait;

use crate::domain::{Player, Tournament};
use crate::error::Result;

/// Provider of slow-changing reference records
#[async_trait]
pub trait ReferenceSource: Send + Sync + 'static {
    fn name(&self) -> &str;

    /// Current singles ranking, best first. Each player carries rank and points.
    async fn fetch_rankings(&self) -> Result<Vec<Player>>;

    /// Tournaments currently on the calendar
    async fn fetch_tournaments(&self) -> Result<Vec<Tournament>>;
}
