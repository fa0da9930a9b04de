use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report backend health, probing the snapshot store.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let topics = state.hub().topic_count();
    if let Err(err) = state.store().health_check().await {
        warn!(error = %err, "snapshot store health check failed");
        return HealthResponse::degraded(topics);
    }
    HealthResponse::ok(topics)
}
