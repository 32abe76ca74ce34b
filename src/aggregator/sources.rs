//! Capability-equivalent live match sources
//!
//! The aggregator walks an ordered list of these until one produces matches.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::{Match, MatchStatus};
use crate::error::Result;
use crate::persistence::MatchStore;

/// Where a source's data comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// External provider; results are cached and persisted
    Remote,
    /// Aggregator's own cache
    Cache,
    /// Persisted storage
    Store,
}

#[async_trait]
pub trait MatchSource: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn kind(&self) -> SourceKind;

    /// Currently live matches
    async fn fetch_live(&self) -> Result<Vec<Match>>;
}

/// Match id -> last fetched match
#[derive(Default)]
pub struct MatchCache {
    entries: RwLock<HashMap<String, Match>>,
}

impl MatchCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, id: &str) -> Option<Match> {
        self.entries.read().await.get(id).cloned()
    }

    pub async fn insert_all(&self, matches: &[Match]) {
        let mut entries = self.entries.write().await;
        for m in matches {
            entries.insert(m.id.clone(), m.clone());
        }
    }

    /// Drop every entry; returns how many were held
    pub async fn clear(&self) -> usize {
        let mut entries = self.entries.write().await;
        let n = entries.len();
        entries.clear();
        n
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn live(&self) -> Vec<Match> {
        self.entries
            .read()
            .await
            .values()
            .filter(|m| m.status == MatchStatus::Live)
            .cloned()
            .collect()
    }
}

/// Live matches still held in the cache from earlier provider fetches
pub struct CacheSource {
    cache: Arc<MatchCache>,
}

impl CacheSource {
    pub fn new(cache: Arc<MatchCache>) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl MatchSource for CacheSource {
    fn name(&self) -> &str {
        "cache"
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Cache
    }

    async fn fetch_live(&self) -> Result<Vec<Match>> {
        Ok(self.cache.live().await)
    }
}

/// Live matches from persisted storage
pub struct StoreSource {
    store: Arc<dyn MatchStore>,
}

impl StoreSource {
    pub fn new(store: Arc<dyn MatchStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl MatchSource for StoreSource {
    fn name(&self) -> &str {
        "store"
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Store
    }

    async fn fetch_live(&self) -> Result<Vec<Match>> {
        self.store.list_matches(Some(MatchStatus::Live)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    fn live(id: &str) -> Match {
        Match::new_live(id, "t1", "p1", "p2")
    }

    #[tokio::test]
    async fn test_cache_source_only_yields_live_entries() {
        let cache = Arc::new(MatchCache::new());
        let mut done = live("m2");
        done.finish(crate::domain::Side::One);
        cache.insert_all(&[live("m1"), done]).await;

        let source = CacheSource::new(cache.clone());
        let got = source.fetch_live().await.unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].id, "m1");
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn test_cache_clear() {
        let cache = MatchCache::new();
        cache.insert_all(&[live("m1"), live("m2")]).await;
        assert_eq!(cache.clear().await, 2);
        assert!(cache.get("m1").await.is_none());
    }

    #[tokio::test]
    async fn test_store_source_reads_live_matches() {
        let store = Arc::new(MemoryStore::new());
        store.upsert_match(&live("m1")).await.unwrap();

        let source = StoreSource::new(store);
        assert_eq!(source.kind(), SourceKind::Store);
        assert_eq!(source.fetch_live().await.unwrap().len(), 1);
    }
}
