use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use hardcourt::api::types::{HealthResponse, SchedulerStatusResponse};
use hardcourt::api::{create_router, AppState};
use hardcourt::broadcast::Hub;
use hardcourt::config::HubConfig;
use hardcourt::coordination::Shutdown;
use hardcourt::domain::{Match, Player, Side};
use hardcourt::persistence::{MatchStore, MemoryStore};
use hardcourt::scheduler::Scheduler;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

async fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store
        .upsert_player(&Player {
            id: "p1".into(),
            name: "J. Sinner".into(),
            country_code: "IT".into(),
            rank: 1,
            points: 11830,
        })
        .await
        .unwrap();
    store
        .upsert_match(&Match::new_live("match_0", "t1", "p1", "p2"))
        .await
        .unwrap();
    let mut done = Match::new_live("match_1", "t1", "p3", "p4");
    done.finish(Side::One);
    store.upsert_match(&done).await.unwrap();
    store
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let resp = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

#[tokio::test]
async fn health_reports_store_and_subscribers() {
    let shutdown = Shutdown::new();
    let (hub, _task) = Hub::spawn(&HubConfig::default(), shutdown.token());
    let _sub = hub.register().await.unwrap();
    let store = seeded_store().await;
    let app = create_router(AppState::new(store.clone(), hub));

    let (status, body) = get(app.clone(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    let health: HealthResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(health.status, "ok");
    assert_eq!(health.subscribers, 1);

    store.set_offline(true);
    let (status, body) = get(app, "/health").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let health: HealthResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(health.store, "disconnected");
}

#[tokio::test]
async fn match_listing_filters_by_status() {
    let shutdown = Shutdown::new();
    let (hub, _task) = Hub::spawn(&HubConfig::default(), shutdown.token());
    let app = create_router(AppState::new(seeded_store().await, hub));

    let (status, body) = get(app.clone(), "/api/matches").await;
    assert_eq!(status, StatusCode::OK);
    let all: Vec<Match> = serde_json::from_slice(&body).unwrap();
    assert_eq!(all.len(), 2);

    let (_, body) = get(app.clone(), "/api/matches?status=live").await;
    let live: Vec<Match> = serde_json::from_slice(&body).unwrap();
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].id, "match_0");

    let (status, _) = get(app, "/api/matches?status=postponed").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn match_by_id_includes_players() {
    let shutdown = Shutdown::new();
    let (hub, _task) = Hub::spawn(&HubConfig::default(), shutdown.token());
    let app = create_router(AppState::new(seeded_store().await, hub));

    let (status, body) = get(app.clone(), "/api/matches/match_0").await;
    assert_eq!(status, StatusCode::OK);
    let m: Match = serde_json::from_slice(&body).unwrap();
    assert_eq!(m.player1.unwrap().name, "J. Sinner");

    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["score"]["points_p1"], "0");
    assert_eq!(json["score"]["serving"], 1);
    assert!(json.get("win_prob_p1").is_some());

    let (status, _) = get(app, "/api/matches/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn scheduler_status_reflects_lifecycle() {
    let shutdown = Shutdown::new();
    let (hub, _task) = Hub::spawn(&HubConfig::default(), shutdown.token());
    let scheduler = Arc::new(Scheduler::new(
        Vec::new(),
        Duration::from_secs(60),
        Duration::from_secs(55),
    ));
    let app = create_router(
        AppState::new(Arc::new(MemoryStore::new()), hub).with_scheduler(scheduler.clone()),
    );

    let (_, body) = get(app.clone(), "/api/scheduler/status").await;
    let status: SchedulerStatusResponse = serde_json::from_slice(&body).unwrap();
    assert!(status.enabled);
    assert!(!status.running);
    assert_eq!(status.interval_secs, 60);

    scheduler.start().await;
    let (_, body) = get(app, "/api/scheduler/status").await;
    let status: SchedulerStatusResponse = serde_json::from_slice(&body).unwrap();
    assert!(status.running);
    scheduler.stop().await;
}
