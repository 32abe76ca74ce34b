use hardcourt::broadcast::{spawn_bridge, Hub};
use hardcourt::config::HubConfig;
use hardcourt::coordination::Shutdown;
use hardcourt::domain::Match;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

fn hub_config(subscriber_buffer: usize) -> HubConfig {
    HubConfig {
        subscriber_buffer,
        command_buffer: 256,
    }
}

#[tokio::test]
async fn slow_subscriber_never_delays_the_others() {
    let shutdown = Shutdown::new();
    let (hub, _task) = Hub::spawn(&hub_config(4), shutdown.token());

    // Never reads
    let stalled = hub.register().await.unwrap();
    let mut readers = Vec::new();
    for _ in 0..3 {
        readers.push(hub.register().await.unwrap());
    }

    for i in 0..20 {
        let payload: Arc<str> = Arc::from(format!("update-{}", i));
        tokio::time::timeout(Duration::from_millis(200), hub.broadcast(payload))
            .await
            .expect("broadcast must not block on a stalled subscriber")
            .unwrap();

        for reader in readers.iter_mut() {
            let got = reader.recv().await.unwrap();
            assert_eq!(&*got, format!("update-{}", i).as_str());
        }
    }

    assert_eq!(hub.subscriber_count().await.unwrap(), 3);
    drop(stalled);
}

#[tokio::test]
async fn evicted_subscriber_sees_end_of_stream() {
    let shutdown = Shutdown::new();
    let (hub, _task) = Hub::spawn(&hub_config(2), shutdown.token());
    let mut sub = hub.register().await.unwrap();

    for i in 0..3 {
        hub.broadcast(Arc::from(format!("{}", i))).await.unwrap();
    }
    assert_eq!(hub.subscriber_count().await.unwrap(), 0);

    assert_eq!(&*sub.recv().await.unwrap(), "0");
    assert_eq!(&*sub.recv().await.unwrap(), "1");
    assert!(sub.recv().await.is_none());
}

#[tokio::test]
async fn bridge_feeds_queue_into_hub_until_shutdown() {
    let shutdown = Shutdown::new();
    let (hub, hub_task) = Hub::spawn(&hub_config(16), shutdown.token());
    let mut sub = hub.register().await.unwrap();

    let (tx, rx) = mpsc::channel(100);
    let bridge = spawn_bridge(rx, hub.clone(), shutdown.token());

    for i in 0..5 {
        tx.send(Match::new_live(format!("match_{}", i), "t1", "p1", "p2"))
            .await
            .unwrap();
    }
    for i in 0..5 {
        let payload = sub.recv().await.unwrap();
        let m: Match = serde_json::from_str(&payload).unwrap();
        assert_eq!(m.id, format!("match_{}", i));
    }

    shutdown.request_shutdown();
    bridge.await.unwrap();
    hub_task.await.unwrap();
    assert!(sub.recv().await.is_none());
}
