use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::NaiveDate;

use opsdeck_core::StoreId;
use opsdeck_scoring::{ScoreSnapshot, StoreScope};

use super::SnapshotStore;
use crate::error::StoreError;

/// In-memory snapshot store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemorySnapshotStore {
    inner: RwLock<BTreeMap<(StoreId, NaiveDate), ScoreSnapshot>>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> StoreError {
    StoreError::Storage("snapshot store lock poisoned".to_string())
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn upsert(&self, mut snapshot: ScoreSnapshot) -> Result<ScoreSnapshot, StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        let key = (snapshot.store_id, snapshot.snapshot_date);
        if let Some(existing) = map.get(&key) {
            snapshot.id = existing.id;
        }
        map.insert(key, snapshot.clone());
        Ok(snapshot)
    }

    async fn get(&self, store_id: StoreId, snapshot_date: NaiveDate) -> Result<Option<ScoreSnapshot>, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.get(&(store_id, snapshot_date)).cloned())
    }

    async fn get_snapshots(&self, snapshot_date: NaiveDate, scope: StoreScope) -> Result<Vec<ScoreSnapshot>, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map
            .values()
            .filter(|s| s.snapshot_date == snapshot_date && scope.matches(s.business_id, s.vertical_id))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::Utc;

    use opsdeck_core::{BusinessId, SnapshotId};
    use opsdeck_scoring::ScoreFields;

    use super::*;

    fn snapshot(store_id: StoreId, business_id: BusinessId, date: NaiveDate, heat: f64) -> ScoreSnapshot {
        ScoreSnapshot {
            id: SnapshotId::new(),
            store_id,
            business_id,
            vertical_id: None,
            snapshot_date: date,
            computed_at: Utc::now(),
            fields: ScoreFields {
                heat_score: heat,
                churn_risk: 20.0,
                order_prob_7d: 40.0,
                avg_order_value: 0.0,
                revenue_30d: 0.0,
                revenue_90d: 0.0,
                order_count_30d: 0,
                order_count_90d: 0,
                last_order_at: None,
                days_since_last_order: 999,
                predicted_next_order_at: None,
                restock_window_start: None,
                restock_window_end: None,
                communication_score: 80.0,
                sentiment_score: 0.0,
                deal_activity_score: 0.0,
                follow_up_intensity: 0.0,
                tags: BTreeSet::new(),
            },
        }
    }

    #[tokio::test]
    async fn upsert_same_day_keeps_id_and_replaces_fields() {
        let store = InMemorySnapshotStore::new();
        let (s, b) = (StoreId::new(), BusinessId::new());
        let today = Utc::now().date_naive();

        let first = store.upsert(snapshot(s, b, today, 50.0)).await.unwrap();
        let second = store.upsert(snapshot(s, b, today, 75.0)).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(store.len(), 1);
        let stored = store.get(s, today).await.unwrap().unwrap();
        assert_eq!(stored.fields.heat_score, 75.0);
    }

    #[tokio::test]
    async fn get_snapshots_filters_by_date_and_scope() {
        let store = InMemorySnapshotStore::new();
        let (b1, b2) = (BusinessId::new(), BusinessId::new());
        let today = Utc::now().date_naive();
        let yesterday = today.pred_opt().unwrap();

        store.upsert(snapshot(StoreId::new(), b1, today, 50.0)).await.unwrap();
        store.upsert(snapshot(StoreId::new(), b2, today, 50.0)).await.unwrap();
        store.upsert(snapshot(StoreId::new(), b1, yesterday, 50.0)).await.unwrap();

        assert_eq!(store.get_snapshots(today, StoreScope::all()).await.unwrap().len(), 2);
        let scoped = StoreScope {
            business_id: Some(b1),
            vertical_id: None,
        };
        let only_b1 = store.get_snapshots(today, scoped).await.unwrap();
        assert_eq!(only_b1.len(), 1);
        assert_eq!(only_b1[0].business_id, b1);
    }
}
