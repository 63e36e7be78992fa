//! Score snapshot persistence, one row per (store, calendar date).

pub mod in_memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::NaiveDate;

use opsdeck_core::StoreId;
use opsdeck_scoring::{ScoreSnapshot, StoreScope};

use crate::error::StoreError;

pub use in_memory::InMemorySnapshotStore;
pub use postgres::PostgresSnapshotStore;

#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Insert or fully replace the snapshot for `(store_id, snapshot_date)`.
    ///
    /// Last write wins. When a row already exists its id is kept and the
    /// returned snapshot carries that id.
    async fn upsert(&self, snapshot: ScoreSnapshot) -> Result<ScoreSnapshot, StoreError>;

    async fn get(&self, store_id: StoreId, snapshot_date: NaiveDate) -> Result<Option<ScoreSnapshot>, StoreError>;

    /// All snapshots for `snapshot_date` within `scope`, ordered by store id.
    async fn get_snapshots(&self, snapshot_date: NaiveDate, scope: StoreScope) -> Result<Vec<ScoreSnapshot>, StoreError>;
}
