pub mod memory;

use futures::future::BoxFuture;

use crate::dao::StorageResult;
use crate::state::board::ScoreboardState;

/// Abstraction over the durable keyed snapshot storage.
///
/// One entry per match key, holding the latest full [`ScoreboardState`] as an
/// opaque unit. Entries idle longer than the store's retention window are
/// evicted by the store itself; writes and fetches both reset the countdown.
pub trait SnapshotStore: Send + Sync {
    /// Return the stored snapshot for `key`, atomically initializing it with
    /// a default state when absent. Concurrent first-fetches must converge on
    /// a single stored value.
    fn fetch_or_init(&self, key: &str) -> BoxFuture<'static, StorageResult<ScoreboardState>>;
    /// Unconditionally overwrite the snapshot for `key`.
    fn write(&self, key: &str, state: ScoreboardState) -> BoxFuture<'static, StorageResult<()>>;
    /// Remove the snapshot for `key` immediately, returning whether an entry
    /// existed. Called by the surrounding application whenever the match's
    /// roster or game composition changes shape.
    fn invalidate(&self, key: &str) -> BoxFuture<'static, StorageResult<bool>>;
    /// Evict every entry idle past the retention window, returning how many
    /// were removed.
    fn purge_expired(&self) -> BoxFuture<'static, StorageResult<usize>>;
    /// Probe backend liveness.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}
