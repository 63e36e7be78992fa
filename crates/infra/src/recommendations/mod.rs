//! Recommendation persistence and the downstream follow-up queue.
//!
//! Both live behind one trait so that claiming a recommendation, enqueueing its
//! follow-up and flipping `synced_to_followup` happen as a single atomic step.

pub mod in_memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use opsdeck_core::{FollowupId, RecommendationId, StoreId};
use opsdeck_scoring::{FollowupEntry, Recommendation};

use crate::error::StoreError;

pub use in_memory::InMemoryRecommendationStore;
pub use postgres::PostgresRecommendationStore;

/// Result of [`RecommendationStore::claim_and_enqueue`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum ClaimOutcome {
    /// This call claimed the recommendation and created the queue entry.
    Enqueued(FollowupId),
    /// Another sync already claimed it; nothing was written.
    AlreadySynced,
}

#[async_trait]
pub trait RecommendationStore: Send + Sync {
    /// Persist `rec` unless a recommendation for the same source snapshot exists.
    ///
    /// Returns `false` (and writes nothing) for a duplicate.
    async fn insert_if_absent(&self, rec: Recommendation) -> Result<bool, StoreError>;

    async fn get(&self, id: RecommendationId) -> Result<Option<Recommendation>, StoreError>;

    /// Recommendations for one store, or all stores, newest first.
    async fn list(&self, store_id: Option<StoreId>) -> Result<Vec<Recommendation>, StoreError>;

    /// Unsynced recommendations still actionable at `now` (`expires_at > now`),
    /// ordered by priority ascending, then creation time.
    ///
    /// Expired rows stay stored but are never returned here again.
    async fn list_unsynced(
        &self,
        store_id: Option<StoreId>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Recommendation>, StoreError>;

    /// Atomically claim `entry.recommendation_id`, insert `entry` into the
    /// follow-up queue and record its id on the recommendation.
    ///
    /// Errors with `StoreError::NotFound` for an unknown recommendation.
    async fn claim_and_enqueue(&self, entry: FollowupEntry) -> Result<ClaimOutcome, StoreError>;

    async fn list_followups(&self, store_id: Option<StoreId>) -> Result<Vec<FollowupEntry>, StoreError>;
}
