pub mod board;
pub mod hub;

use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::dao::snapshot_store::{SnapshotStore, memory::MemorySnapshotStore};

pub use self::hub::ChannelHub;

/// Cheap-to-clone handle on the application state.
pub type SharedState = Arc<AppState>;

/// Central application state: the broadcast hub, the snapshot store, and the
/// immutable runtime configuration.
pub struct AppState {
    config: AppConfig,
    hub: ChannelHub,
    store: Arc<dyn SnapshotStore>,
}

impl AppState {
    /// Construct the shared state with the in-memory snapshot backend.
    pub fn new(config: AppConfig) -> SharedState {
        let store = Arc::new(MemorySnapshotStore::new(config.snapshot_ttl));
        Self::with_store(config, store)
    }

    /// Construct the shared state around an explicit store implementation.
    pub fn with_store(config: AppConfig, store: Arc<dyn SnapshotStore>) -> SharedState {
        let hub = ChannelHub::new(config.channel_capacity);
        Arc::new(Self { config, hub, store })
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The topic-addressed broadcast hub.
    pub fn hub(&self) -> &ChannelHub {
        &self.hub
    }

    /// Handle to the snapshot store.
    pub fn store(&self) -> Arc<dyn SnapshotStore> {
        Arc::clone(&self.store)
    }

    /// Idle retention window configured for snapshots.
    pub fn snapshot_ttl(&self) -> Duration {
        self.config.snapshot_ttl
    }
}
