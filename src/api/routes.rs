use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};

use crate::api::{handlers, state::AppState, websocket::websocket_handler};

pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health_handler))
        // Match endpoints
        .route("/api/matches", get(handlers::list_matches))
        .route("/api/matches/:id", get(handlers::get_match))
        // Scheduler endpoints
        .route("/api/scheduler/status", get(handlers::get_scheduler_status))
        .route("/api/scraper/status", get(handlers::get_scheduler_status))
        // WebSocket endpoint
        .route("/ws", get(websocket_handler))
        // Add state and CORS
        .with_state(state)
        .layer(cors)
}
