use axum::{extract::State, http::StatusCode, Json};

use crate::api::{
    state::AppState,
    types::{HealthResponse, SchedulerStatusResponse},
};

/// GET /health -- store reachability, live subscriber count and uptime
pub async fn health_handler(
    State(state): State<AppState>,
) -> std::result::Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let store_status = match state.store.ping().await {
        Ok(()) => "connected".to_string(),
        Err(_) => "disconnected".to_string(),
    };
    let subscribers = state.hub.subscriber_count().await.unwrap_or(0);

    let ok = store_status == "connected";
    let resp = HealthResponse {
        status: if ok {
            "ok".to_string()
        } else {
            "degraded".to_string()
        },
        store: store_status,
        subscribers,
        uptime_secs: state.uptime_seconds(),
    };

    if ok {
        Ok(Json(resp))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(resp)))
    }
}

/// GET /api/scheduler/status
pub async fn get_scheduler_status(State(state): State<AppState>) -> Json<SchedulerStatusResponse> {
    let resp = match &state.scheduler {
        Some(scheduler) => {
            let status = scheduler.status().await;
            SchedulerStatusResponse {
                enabled: true,
                running: status.running,
                interval_secs: status.interval.as_secs(),
            }
        }
        None => SchedulerStatusResponse {
            enabled: false,
            running: false,
            interval_secs: 0,
        },
    };
    Json(resp)
}
