use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::adapters::ReferenceSource;
use crate::aggregator::{Aggregator, MatchSource};
use crate::coordination::ShutdownToken;
use crate::domain::Player;
use crate::error::{HardcourtError, Result};
use crate::persistence::{persist_match_graph, MatchStore};

/// A unit of work run once per scheduler cycle
#[async_trait]
pub trait ScheduledJob: Send + Sync + 'static {
    fn name(&self) -> &str;

    /// Run one pass. Long jobs should give up when `token` fires.
    async fn run(&self, token: ShutdownToken) -> Result<()>;
}

/// Scrape the provider's live events into persisted storage
pub struct LiveSyncJob {
    provider: Arc<dyn MatchSource>,
    store: Arc<dyn MatchStore>,
}

impl LiveSyncJob {
    pub fn new(provider: Arc<dyn MatchSource>, store: Arc<dyn MatchStore>) -> Self {
        Self { provider, store }
    }
}

#[async_trait]
impl ScheduledJob for LiveSyncJob {
    fn name(&self) -> &str {
        "live-sync"
    }

    async fn run(&self, token: ShutdownToken) -> Result<()> {
        let matches = tokio::select! {
            fetched = self.provider.fetch_live() => {
                fetched.map_err(|e| HardcourtError::job_failure(self.name(), e))?
            }
            _ = token.cancelled() => return Err(HardcourtError::Cancelled),
        };

        let mut failed = 0usize;
        for m in &matches {
            if token.is_cancelled() {
                return Err(HardcourtError::Cancelled);
            }
            if let Err(e) = persist_match_graph(self.store.as_ref(), m).await {
                debug!(match_id = %m.id, error = %e, "live-sync upsert failed");
                failed += 1;
            }
        }

        if failed > 0 {
            return Err(HardcourtError::job_failure(
                self.name(),
                format!("{} of {} upserts failed", failed, matches.len()),
            ));
        }

        info!(source = self.provider.name(), synced = matches.len(), "live-sync complete");
        Ok(())
    }
}

/// Refresh player rankings and the tournament calendar.
///
/// Known players only get their rank and points updated; unknown ones are
/// created from the ranking row. A failed half is logged and the other half
/// still runs.
pub struct ReferenceSyncJob {
    source: Arc<dyn ReferenceSource>,
    store: Arc<dyn MatchStore>,
}

impl ReferenceSyncJob {
    pub fn new(source: Arc<dyn ReferenceSource>, store: Arc<dyn MatchStore>) -> Self {
        Self { source, store }
    }

    async fn sync_rankings(&self, token: &ShutdownToken) -> Result<usize> {
        let ranked = tokio::select! {
            fetched = self.source.fetch_rankings() => fetched?,
            _ = token.cancelled() => return Err(HardcourtError::Cancelled),
        };

        for row in &ranked {
            if token.is_cancelled() {
                return Err(HardcourtError::Cancelled);
            }
            let player = match self.store.get_player(&row.id).await? {
                Some(existing) => Player {
                    rank: row.rank,
                    points: row.points,
                    ..existing
                },
                None => row.clone(),
            };
            self.store.upsert_player(&player).await?;
        }
        Ok(ranked.len())
    }

    async fn sync_tournaments(&self, token: &ShutdownToken) -> Result<usize> {
        let tournaments = tokio::select! {
            fetched = self.source.fetch_tournaments() => fetched?,
            _ = token.cancelled() => return Err(HardcourtError::Cancelled),
        };

        for t in &tournaments {
            if token.is_cancelled() {
                return Err(HardcourtError::Cancelled);
            }
            self.store.upsert_tournament(t).await?;
        }
        Ok(tournaments.len())
    }
}

#[async_trait]
impl ScheduledJob for ReferenceSyncJob {
    fn name(&self) -> &str {
        "reference-sync"
    }

    async fn run(&self, token: ShutdownToken) -> Result<()> {
        let mut failures = Vec::new();

        match self.sync_rankings(&token).await {
            Ok(count) => debug!(count, "rankings refreshed"),
            Err(HardcourtError::Cancelled) => return Err(HardcourtError::Cancelled),
            Err(e) => {
                warn!(source = self.source.name(), error = %e, "rankings refresh failed");
                failures.push(format!("rankings: {}", e));
            }
        }

        match self.sync_tournaments(&token).await {
            Ok(count) => debug!(count, "tournaments refreshed"),
            Err(HardcourtError::Cancelled) => return Err(HardcourtError::Cancelled),
            Err(e) => {
                warn!(source = self.source.name(), error = %e, "tournament refresh failed");
                failures.push(format!("tournaments: {}", e));
            }
        }

        if !failures.is_empty() {
            return Err(HardcourtError::job_failure(self.name(), failures.join("; ")));
        }

        info!(source = self.source.name(), "reference-sync complete");
        Ok(())
    }
}

/// Wholesale cache invalidation
pub struct CacheSweepJob {
    aggregator: Arc<Aggregator>,
}

impl CacheSweepJob {
    pub fn new(aggregator: Arc<Aggregator>) -> Self {
        Self { aggregator }
    }
}

#[async_trait]
impl ScheduledJob for CacheSweepJob {
    fn name(&self) -> &str {
        "cache-sweep"
    }

    async fn run(&self, _token: ShutdownToken) -> Result<()> {
        self.aggregator.clear_cache().await;
        Ok(())
    }
}
