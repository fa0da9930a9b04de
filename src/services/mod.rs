//! Service layer: connection handling, snapshot orchestration, and streams.

pub mod documentation;
pub mod health_service;
pub mod snapshot_service;
pub mod sse_service;
pub mod websocket_service;
