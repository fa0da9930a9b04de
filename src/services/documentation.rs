use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the scoreboard backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::snapshot::fetch_snapshot,
        crate::routes::snapshot::invalidate_snapshot,
        crate::routes::sse::live_stream,
        crate::routes::websocket::ws_handler,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::ws::ClientCommand,
            crate::dto::ws::ServerFrame,
            crate::dto::ws::ActionEnvelope,
            crate::dto::ws::EnvelopeAction,
            crate::state::board::ScoreboardState,
            crate::state::board::Team,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "snapshots", description = "Snapshot fetch and invalidation for the surrounding application"),
        (name = "live", description = "Read-only SSE mirrors of match topics"),
        (name = "channel", description = "WebSocket channel for scoreboard sessions"),
    )
)]
pub struct ApiDoc;
