use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::rate_limit::RateLimiter;
use super::sources::{CacheSource, MatchCache, MatchSource, SourceKind, StoreSource};
use crate::coordination::ShutdownToken;
use crate::domain::Match;
use crate::error::{HardcourtError, Result};
use crate::persistence::{persist_match_logged, MatchStore};

/// Multi-source live match fetcher.
///
/// Sources are tried in order; the first one with matches wins. Only remote
/// results refresh the cache and are written back to the store.
pub struct Aggregator {
    sources: Vec<Arc<dyn MatchSource>>,
    cache: Arc<MatchCache>,
    store: Arc<dyn MatchStore>,
    limiter: RateLimiter,
}

impl Aggregator {
    /// Standard chain: provider, then cache, then persisted storage
    pub fn new(
        provider: Arc<dyn MatchSource>,
        store: Arc<dyn MatchStore>,
        rate_limit: Duration,
    ) -> Self {
        let cache = Arc::new(MatchCache::new());
        let sources: Vec<Arc<dyn MatchSource>> = vec![
            provider,
            Arc::new(CacheSource::new(cache.clone())),
            Arc::new(StoreSource::new(store.clone())),
        ];
        Self::with_sources(sources, cache, store, rate_limit)
    }

    pub fn with_sources(
        sources: Vec<Arc<dyn MatchSource>>,
        cache: Arc<MatchCache>,
        store: Arc<dyn MatchStore>,
        rate_limit: Duration,
    ) -> Self {
        Self {
            sources,
            cache,
            store,
            limiter: RateLimiter::new(rate_limit),
        }
    }

    /// Live matches from the first source that has any.
    ///
    /// Remote sources are rate limited; the wait and every source call end
    /// early with `Cancelled` when `token` fires. An empty cache is a miss,
    /// not an answer. Otherwise the last source consulted decides: an empty
    /// answer yields no matches, a failure yields `AllSourcesExhausted`.
    pub async fn fetch_live_matches(&self, token: &ShutdownToken) -> Result<Vec<Match>> {
        let mut failures = Vec::new();
        let mut answered = false;

        for source in &self.sources {
            if source.kind() == SourceKind::Remote {
                self.limiter.acquire(token).await?;
            }

            let fetched = tokio::select! {
                biased;
                _ = token.cancelled() => return Err(HardcourtError::Cancelled),
                fetched = source.fetch_live() => fetched,
            };

            match fetched {
                Ok(matches) if !matches.is_empty() => {
                    debug!(source = source.name(), count = matches.len(), "fetched live matches");
                    if source.kind() == SourceKind::Remote {
                        self.absorb(&matches).await;
                    }
                    return Ok(matches);
                }
                Ok(_) => {
                    debug!(source = source.name(), "source has no live matches");
                    if source.kind() != SourceKind::Cache {
                        answered = true;
                    }
                }
                Err(e) => {
                    warn!(source = source.name(), error = %e, "source failed, falling back");
                    failures.push(format!("{}: {}", source.name(), e));
                    answered = false;
                }
            }
        }

        if answered {
            Ok(Vec::new())
        } else {
            Err(HardcourtError::AllSourcesExhausted(failures.join("; ")))
        }
    }

    /// Cache the fresh matches and persist them in the background
    async fn absorb(&self, matches: &[Match]) {
        self.cache.insert_all(matches).await;

        let store = self.store.clone();
        let matches = matches.to_vec();
        tokio::spawn(async move {
            for m in &matches {
                persist_match_logged(store.as_ref(), m).await;
            }
        });
    }

    pub async fn cached_match(&self, id: &str) -> Option<Match> {
        self.cache.get(id).await
    }

    /// Drop the whole cache; returns the number of entries removed
    pub async fn clear_cache(&self) -> usize {
        let removed = self.cache.clear().await;
        debug!(removed, "cache cleared");
        removed
    }

    pub fn cache(&self) -> &Arc<MatchCache> {
        &self.cache
    }

    /// Fetch every `interval` (first fetch one interval from now) and push
    /// each match onto `out`. A full queue drops the match.
    pub fn start_periodic_fetch(
        self: Arc<Self>,
        token: ShutdownToken,
        out: mpsc::Sender<Match>,
        interval: Duration,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(interval_secs = interval.as_secs(), "periodic fetch started");
            let mut ticker = interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                let matches = match self.fetch_live_matches(&token).await {
                    Ok(matches) => matches,
                    Err(HardcourtError::Cancelled) => break,
                    Err(e) => {
                        warn!(error = %e, "periodic fetch failed");
                        continue;
                    }
                };

                for m in matches {
                    match out.try_send(m) {
                        Ok(()) => {}
                        Err(TrySendError::Full(m)) => {
                            debug!(match_id = %m.id, "update queue full, dropping match");
                        }
                        Err(TrySendError::Closed(_)) => {
                            info!("update queue closed, stopping periodic fetch");
                            return;
                        }
                    }
                }
            }

            info!("periodic fetch stopped");
        })
    }
}
