use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::error;

use crate::api::{state::AppState, types::MatchQuery};
use crate::domain::{Match, MatchStatus};

/// GET /api/matches?status=
pub async fn list_matches(
    State(state): State<AppState>,
    Query(query): Query<MatchQuery>,
) -> std::result::Result<Json<Vec<Match>>, (StatusCode, String)> {
    let status = match query.status.as_deref() {
        None | Some("") => None,
        Some(raw) => Some(
            MatchStatus::try_from(raw).map_err(|e| (StatusCode::BAD_REQUEST, e))?,
        ),
    };

    state.store.list_matches(status).await.map(Json).map_err(|e| {
        error!(error = %e, "failed to list matches");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })
}

/// GET /api/matches/:id
pub async fn get_match(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> std::result::Result<Json<Match>, (StatusCode, String)> {
    match state.store.get_match(&id).await {
        Ok(Some(m)) => Ok(Json(m)),
        Ok(None) => Err((StatusCode::NOT_FOUND, format!("match {} not found", id))),
        Err(e) => {
            error!(match_id = %id, error = %e, "failed to load match");
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}
