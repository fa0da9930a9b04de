use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};

use crate::{
    error::AppError, services::snapshot_service, state::SharedState,
    state::board::ScoreboardState,
};

#[utoipa::path(
    get,
    path = "/matches/{key}/snapshot",
    params(("key" = String, Path, description = "Match key")),
    responses((status = 200, description = "Current snapshot, freshly defaulted when absent", body = ScoreboardState))
)]
/// Return the current snapshot for a match, initializing a default if none
/// is stored yet.
pub async fn fetch_snapshot(
    State(state): State<SharedState>,
    Path(key): Path<String>,
) -> Result<Json<ScoreboardState>, AppError> {
    let snapshot = snapshot_service::fetch_or_init(&state, &key).await?;
    Ok(Json(snapshot))
}

#[utoipa::path(
    delete,
    path = "/matches/{key}/snapshot",
    params(("key" = String, Path, description = "Match key")),
    responses(
        (status = 204, description = "Snapshot removed"),
        (status = 404, description = "No snapshot stored for this key"),
    )
)]
/// Remove the stored snapshot for a match. The surrounding application calls
/// this whenever the match's team or game composition changes.
pub async fn invalidate_snapshot(
    State(state): State<SharedState>,
    Path(key): Path<String>,
) -> Result<StatusCode, AppError> {
    if snapshot_service::invalidate(&state, &key).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("no snapshot for `{key}`")))
    }
}

/// Configure the snapshot routes subtree.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route(
        "/matches/{key}/snapshot",
        get(fetch_snapshot).delete(invalidate_snapshot),
    )
}
