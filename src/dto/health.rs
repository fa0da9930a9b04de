use std::time::SystemTime;

use serde::Serialize;
use utoipa::ToSchema;

/// Health payload returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Number of match topics currently holding subscribers.
    pub topics: usize,
    /// Server time the payload was produced at, RFC 3339.
    pub timestamp: String,
}

impl HealthResponse {
    /// Healthy response.
    pub fn ok(topics: usize) -> Self {
        Self {
            status: "ok".to_string(),
            topics,
            timestamp: super::format_system_time(SystemTime::now()),
        }
    }

    /// Response indicating the snapshot store failed its health check.
    pub fn degraded(topics: usize) -> Self {
        Self {
            status: "degraded".to_string(),
            topics,
            timestamp: super::format_system_time(SystemTime::now()),
        }
    }
}
