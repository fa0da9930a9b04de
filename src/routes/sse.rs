use std::convert::Infallible;

use axum::{
    Router,
    extract::{Path, State},
    response::sse::Sse,
    routing::get,
};
use futures::Stream;
use tracing::info;

use crate::{
    error::AppError,
    services::{snapshot_service, sse_service},
    state::SharedState,
};

#[utoipa::path(
    get,
    path = "/matches/{key}/live",
    params(("key" = String, Path, description = "Match key")),
    responses((status = 200, description = "Read-only scoreboard stream", content_type = "text/event-stream", body = String))
)]
/// Stream a match's state frames as server-sent events, starting with the
/// current snapshot.
pub async fn live_stream(
    State(state): State<SharedState>,
    Path(key): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>>, AppError> {
    let snapshot = snapshot_service::fetch_or_init(&state, &key).await?;
    let receiver = state.hub().subscribe(&key);
    info!(%key, "new live SSE connection");
    Ok(sse_service::to_sse_stream(state, key, snapshot, receiver))
}

/// Configure the SSE endpoint.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/matches/{key}/live", get(live_stream))
}
