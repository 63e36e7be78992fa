use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use opsdeck_core::{RecommendationId, SnapshotId, StoreId};
use opsdeck_scoring::{FollowupEntry, Recommendation};

use super::{ClaimOutcome, RecommendationStore};
use crate::error::StoreError;

#[derive(Debug, Default)]
struct Tables {
    recommendations: HashMap<RecommendationId, Recommendation>,
    by_snapshot: HashMap<SnapshotId, RecommendationId>,
    followups: Vec<FollowupEntry>,
}

/// In-memory recommendation store + follow-up queue for tests/dev.
///
/// A single lock guards both tables, so a claim and its enqueue are never
/// observed half-done.
#[derive(Debug, Default)]
pub struct InMemoryRecommendationStore {
    inner: RwLock<Tables>,
}

impl InMemoryRecommendationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue entries for `store_id` created at or after `since`.
    pub fn count_followups_since(&self, store_id: StoreId, since: DateTime<Utc>) -> usize {
        self.inner
            .read()
            .map(|t| {
                t.followups
                    .iter()
                    .filter(|e| e.store_id == store_id && e.created_at >= since)
                    .count()
            })
            .unwrap_or(0)
    }
}

fn poisoned() -> StoreError {
    StoreError::Storage("recommendation store lock poisoned".to_string())
}

#[async_trait]
impl RecommendationStore for InMemoryRecommendationStore {
    async fn insert_if_absent(&self, rec: Recommendation) -> Result<bool, StoreError> {
        let mut t = self.inner.write().map_err(|_| poisoned())?;
        if t.by_snapshot.contains_key(&rec.snapshot_id) {
            return Ok(false);
        }
        if t.recommendations.contains_key(&rec.id) {
            return Err(StoreError::Conflict(format!("recommendation {} already exists", rec.id)));
        }
        t.by_snapshot.insert(rec.snapshot_id, rec.id);
        t.recommendations.insert(rec.id, rec);
        Ok(true)
    }

    async fn get(&self, id: RecommendationId) -> Result<Option<Recommendation>, StoreError> {
        let t = self.inner.read().map_err(|_| poisoned())?;
        Ok(t.recommendations.get(&id).cloned())
    }

    async fn list(&self, store_id: Option<StoreId>) -> Result<Vec<Recommendation>, StoreError> {
        let t = self.inner.read().map_err(|_| poisoned())?;
        let mut recs: Vec<Recommendation> = t
            .recommendations
            .values()
            .filter(|r| store_id.is_none_or(|s| r.store_id == s))
            .cloned()
            .collect();
        recs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(recs)
    }

    async fn list_unsynced(
        &self,
        store_id: Option<StoreId>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Recommendation>, StoreError> {
        let t = self.inner.read().map_err(|_| poisoned())?;
        let mut recs: Vec<Recommendation> = t
            .recommendations
            .values()
            .filter(|r| !r.synced_to_followup && !r.is_expired(now) && store_id.is_none_or(|s| r.store_id == s))
            .cloned()
            .collect();
        recs.sort_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then(a.created_at.cmp(&b.created_at))
                .then(a.id.cmp(&b.id))
        });
        Ok(recs)
    }

    async fn claim_and_enqueue(&self, entry: FollowupEntry) -> Result<ClaimOutcome, StoreError> {
        let mut t = self.inner.write().map_err(|_| poisoned())?;
        let rec = t
            .recommendations
            .get_mut(&entry.recommendation_id)
            .ok_or_else(|| StoreError::NotFound(format!("recommendation {}", entry.recommendation_id)))?;

        if rec.synced_to_followup {
            return Ok(ClaimOutcome::AlreadySynced);
        }
        rec.synced_to_followup = true;
        rec.followup_id = Some(entry.id);

        let id = entry.id;
        t.followups.push(entry);
        Ok(ClaimOutcome::Enqueued(id))
    }

    async fn list_followups(&self, store_id: Option<StoreId>) -> Result<Vec<FollowupEntry>, StoreError> {
        let t = self.inner.read().map_err(|_| poisoned())?;
        Ok(t.followups
            .iter()
            .filter(|f| store_id.is_none_or(|s| f.store_id == s))
            .cloned()
            .collect())
    }
}
