//! Persistence Layer
//!
//! The persisted store is the system of record for matches, players and
//! tournaments. Producers keep their own in-memory working copies and write
//! through this interface with idempotent upserts (last write wins on id).

pub mod memory;

use async_trait::async_trait;
use tracing::warn;

use crate::domain::{Match, MatchStatus, Player, Tournament};
use crate::error::Result;

pub use memory::MemoryStore;

/// Storage collaborator for match data
#[async_trait]
pub trait MatchStore: Send + Sync + 'static {
    /// Create or replace a tournament by id
    async fn upsert_tournament(&self, tournament: &Tournament) -> Result<()>;

    /// Create or replace a player by id. Points of 0 keep the stored points.
    async fn upsert_player(&self, player: &Player) -> Result<()>;

    /// Create or replace a match (score, stats and metrics) by id
    async fn upsert_match(&self, m: &Match) -> Result<()>;

    /// Match by id with its players and tournament attached
    async fn get_match(&self, id: &str) -> Result<Option<Match>>;

    /// All matches, newest first, optionally filtered by status
    async fn list_matches(&self, status: Option<MatchStatus>) -> Result<Vec<Match>>;

    async fn get_player(&self, id: &str) -> Result<Option<Player>>;

    async fn get_tournament(&self, id: &str) -> Result<Option<Tournament>>;

    /// Remove every simulator-generated match; returns the number removed
    async fn delete_simulated(&self) -> Result<u64>;

    /// Cheap reachability check
    async fn ping(&self) -> Result<()>;
}

/// Upsert a match together with its tournament and players.
///
/// A tournament known only by id is stored as a placeholder so the match row
/// always has something to reference.
pub async fn persist_match_graph(store: &dyn MatchStore, m: &Match) -> Result<()> {
    let tournament = m
        .tournament
        .clone()
        .unwrap_or_else(|| Tournament::placeholder(&m.tournament_id));
    store.upsert_tournament(&tournament).await?;

    for player in [&m.player1, &m.player2].into_iter().flatten() {
        store.upsert_player(player).await?;
    }

    store.upsert_match(m).await
}

/// Best-effort variant: failures are logged, never returned
pub async fn persist_match_logged(store: &dyn MatchStore, m: &Match) {
    if let Err(e) = persist_match_graph(store, m).await {
        warn!(match_id = %m.id, error = %e, "failed to persist match");
    }
}
