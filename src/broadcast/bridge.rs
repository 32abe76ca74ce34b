use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::hub::HubHandle;
use crate::coordination::ShutdownToken;
use crate::domain::Match;

/// Relay every match from the producer queue to the hub.
///
/// Real and simulated producers share the same queue, so this is the single
/// point where both feed the transport.
pub fn spawn_bridge(
    mut updates: mpsc::Receiver<Match>,
    hub: HubHandle,
    token: ShutdownToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut relayed: u64 = 0;
        loop {
            let m = tokio::select! {
                next = updates.recv() => match next {
                    Some(m) => m,
                    None => break,
                },
                _ = token.cancelled() => break,
            };

            if let Err(e) = hub.broadcast_match(&m).await {
                warn!(match_id = %m.id, error = %e, "bridge failed to broadcast");
                continue;
            }
            relayed += 1;
        }
        info!(relayed, "Update bridge stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::Hub;
    use crate::config::HubConfig;
    use crate::coordination::Shutdown;

    #[tokio::test]
    async fn test_bridge_relays_queue_to_subscribers() {
        let shutdown = Shutdown::new();
        let (hub, _task) = Hub::spawn(&HubConfig::default(), shutdown.token());
        let mut sub = hub.register().await.unwrap();

        let (tx, rx) = mpsc::channel(4);
        let bridge = spawn_bridge(rx, hub, shutdown.token());

        tx.send(Match::new_live("match_0", "t1", "p1", "p2")).await.unwrap();
        let payload = sub.recv().await.unwrap();
        let m: Match = serde_json::from_str(&payload).unwrap();
        assert_eq!(m.id, "match_0");

        drop(tx);
        bridge.await.unwrap();
    }
}
