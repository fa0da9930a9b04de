//! In-process snapshot store with idle expiry.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use futures::future::BoxFuture;
use tracing::debug;

use crate::dao::StorageResult;
use crate::dao::snapshot_store::SnapshotStore;
use crate::state::board::ScoreboardState;

struct Entry {
    state: ScoreboardState,
    touched: Instant,
}

/// Keyed snapshot cache backed by a [`DashMap`].
///
/// Expiry is enforced lazily on access and by the periodic sweeper the binary
/// runs against [`SnapshotStore::purge_expired`]. Get-or-create goes through
/// the map's entry API, so concurrent first-fetches of the same key settle on
/// one stored default.
pub struct MemorySnapshotStore {
    entries: Arc<DashMap<String, Entry>>,
    ttl: Duration,
}

impl MemorySnapshotStore {
    /// Build a store whose entries expire after `ttl` without a fetch or
    /// write.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            ttl,
        }
    }

    /// Number of live (possibly expired but unswept) entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store currently holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn fetch_or_init(&self, key: &str) -> BoxFuture<'static, StorageResult<ScoreboardState>> {
        let entries = Arc::clone(&self.entries);
        let ttl = self.ttl;
        let key = key.to_string();
        Box::pin(async move {
            // An expired entry must not be resurrected by the fetch.
            entries.remove_if(&key, |_, entry| entry.touched.elapsed() >= ttl);

            let mut entry = entries.entry(key).or_insert_with(|| Entry {
                state: ScoreboardState::default(),
                touched: Instant::now(),
            });
            entry.touched = Instant::now();
            Ok(entry.state.clone())
        })
    }

    fn write(&self, key: &str, state: ScoreboardState) -> BoxFuture<'static, StorageResult<()>> {
        let entries = Arc::clone(&self.entries);
        let key = key.to_string();
        Box::pin(async move {
            entries.insert(
                key,
                Entry {
                    state,
                    touched: Instant::now(),
                },
            );
            Ok(())
        })
    }

    fn invalidate(&self, key: &str) -> BoxFuture<'static, StorageResult<bool>> {
        let entries = Arc::clone(&self.entries);
        let key = key.to_string();
        Box::pin(async move {
            let removed = entries.remove(&key).is_some();
            if removed {
                debug!(%key, "snapshot invalidated");
            }
            Ok(removed)
        })
    }

    fn purge_expired(&self) -> BoxFuture<'static, StorageResult<usize>> {
        let entries = Arc::clone(&self.entries);
        let ttl = self.ttl;
        Box::pin(async move {
            let before = entries.len();
            entries.retain(|_, entry| entry.touched.elapsed() < ttl);
            Ok(before - entries.len())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}
