//! In-process message bus
//!
//! Topic-keyed `tokio::sync::broadcast` channels. Publishing is fire-and-forget:
//! it never waits on readers, and a topic with no readers is not an error.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::trace;

use crate::error::Result;

/// Publisher side of the message bus collaborator
#[async_trait]
pub trait MatchPublisher: Send + Sync + 'static {
    async fn publish(&self, topic: &str, payload: Arc<str>) -> Result<()>;
}

/// Broadcast-channel bus shared by all producers in the process
#[derive(Clone)]
pub struct LocalBus {
    topics: Arc<RwLock<HashMap<String, broadcast::Sender<Arc<str>>>>>,
    capacity: usize,
}

impl LocalBus {
    pub fn new(capacity: usize) -> Self {
        Self {
            topics: Arc::new(RwLock::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    /// Subscribe to a topic, creating it on first use
    pub async fn subscribe(&self, topic: &str) -> broadcast::Receiver<Arc<str>> {
        self.sender(topic).await.subscribe()
    }

    async fn sender(&self, topic: &str) -> broadcast::Sender<Arc<str>> {
        if let Some(tx) = self.topics.read().await.get(topic) {
            return tx.clone();
        }
        let mut topics = self.topics.write().await;
        topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }
}

impl Default for LocalBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl MatchPublisher for LocalBus {
    async fn publish(&self, topic: &str, payload: Arc<str>) -> Result<()> {
        let tx = self.sender(topic).await;
        // Err only means nobody is listening right now
        if tx.send(payload).is_err() {
            trace!(topic, "published with no subscribers");
        }
        Ok(())
    }
}
