//! Broadcast Hub
//!
//! One task owns the subscriber set. Register, unregister, broadcast and the
//! count query all reach it through a single command queue, so the set is only
//! ever touched from that task.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::HubConfig;
use crate::coordination::ShutdownToken;
use crate::domain::Match;
use crate::error::{HardcourtError, Result};

pub type SubscriberId = Uuid;

enum Command {
    Register {
        tx: mpsc::Sender<Arc<str>>,
        reply: oneshot::Sender<SubscriberId>,
    },
    Unregister(SubscriberId),
    Broadcast(Arc<str>),
    Count(oneshot::Sender<usize>),
}

/// Receiving end for one connected client.
///
/// `recv` yields `None` once the hub evicted this subscriber or stopped.
/// Dropping the subscription unregisters it.
pub struct Subscription {
    id: SubscriberId,
    rx: mpsc::Receiver<Arc<str>>,
    commands: mpsc::Sender<Command>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    pub async fn recv(&mut self) -> Option<Arc<str>> {
        self.rx.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        // A full command queue is fine: the closed receiver is evicted on the next broadcast
        let _ = self.commands.try_send(Command::Unregister(self.id));
    }
}

/// Cloneable handle to the hub task
#[derive(Clone)]
pub struct HubHandle {
    commands: mpsc::Sender<Command>,
    subscriber_buffer: usize,
}

fn hub_stopped() -> HardcourtError {
    HardcourtError::Internal("broadcast hub stopped".into())
}

impl HubHandle {
    pub async fn register(&self) -> Result<Subscription> {
        let (tx, rx) = mpsc::channel(self.subscriber_buffer);
        let (reply, id) = oneshot::channel();
        self.commands
            .send(Command::Register { tx, reply })
            .await
            .map_err(|_| hub_stopped())?;
        let id = id.await.map_err(|_| hub_stopped())?;

        Ok(Subscription {
            id,
            rx,
            commands: self.commands.clone(),
        })
    }

    pub async fn unregister(&self, id: SubscriberId) -> Result<()> {
        self.commands
            .send(Command::Unregister(id))
            .await
            .map_err(|_| hub_stopped())
    }

    /// Queue `payload` for every current subscriber. Never waits on a subscriber.
    pub async fn broadcast(&self, payload: Arc<str>) -> Result<()> {
        self.commands
            .send(Command::Broadcast(payload))
            .await
            .map_err(|_| hub_stopped())
    }

    pub async fn broadcast_match(&self, m: &Match) -> Result<()> {
        let payload = serde_json::to_string(m)?;
        self.broadcast(Arc::from(payload)).await
    }

    pub async fn subscriber_count(&self) -> Result<usize> {
        let (reply, count) = oneshot::channel();
        self.commands
            .send(Command::Count(reply))
            .await
            .map_err(|_| hub_stopped())?;
        count.await.map_err(|_| hub_stopped())
    }
}

/// Subscriber registry owned by the hub task
#[derive(Default)]
struct Registry {
    subscribers: HashMap<SubscriberId, mpsc::Sender<Arc<str>>>,
}

impl Registry {
    fn register(&mut self, tx: mpsc::Sender<Arc<str>>) -> SubscriberId {
        let id = Uuid::new_v4();
        self.subscribers.insert(id, tx);
        debug!(subscriber = %id, total = self.subscribers.len(), "subscriber registered");
        id
    }

    fn unregister(&mut self, id: SubscriberId) {
        if self.subscribers.remove(&id).is_some() {
            debug!(subscriber = %id, total = self.subscribers.len(), "subscriber unregistered");
        }
    }

    /// Non-blocking send to everyone; full or closed queues are evicted
    fn broadcast(&mut self, payload: &Arc<str>) {
        self.subscribers
            .retain(|id, tx| match tx.try_send(payload.clone()) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    warn!(subscriber = %id, "slow subscriber evicted");
                    false
                }
                Err(TrySendError::Closed(_)) => {
                    debug!(subscriber = %id, "subscriber gone, removing");
                    false
                }
            });
    }
}

pub struct Hub;

impl Hub {
    /// Spawn the owning task. It exits when `token` fires or every handle is dropped.
    pub fn spawn(config: &HubConfig, token: ShutdownToken) -> (HubHandle, JoinHandle<()>) {
        let (commands, mut rx) = mpsc::channel(config.command_buffer.max(1));
        let handle = HubHandle {
            commands,
            subscriber_buffer: config.subscriber_buffer.max(1),
        };

        let task = tokio::spawn(async move {
            let mut registry = Registry::default();
            loop {
                let command = tokio::select! {
                    command = rx.recv() => match command {
                        Some(command) => command,
                        None => break,
                    },
                    _ = token.cancelled() => break,
                };

                match command {
                    Command::Register { tx, reply } => {
                        let id = registry.register(tx);
                        if reply.send(id).is_err() {
                            registry.unregister(id);
                        }
                    }
                    Command::Unregister(id) => registry.unregister(id),
                    Command::Broadcast(payload) => registry.broadcast(&payload),
                    Command::Count(reply) => {
                        let _ = reply.send(registry.subscribers.len());
                    }
                }
            }
            info!(
                subscribers = registry.subscribers.len(),
                "Broadcast hub stopped"
            );
        });

        (handle, task)
    }
}
