use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use opsdeck_core::StoreId;
use opsdeck_scoring::{
    DealRecord, OrderRecord, SignalSource, Store, StoreDirectory, StoreScope, UpstreamError,
};

use crate::recommendations::InMemoryRecommendationStore;

#[derive(Debug, Default)]
struct Tables {
    stores: HashMap<StoreId, Store>,
    orders: Vec<OrderRecord>,
    sentiment: Vec<(StoreId, f64, DateTime<Utc>)>,
    deals: Vec<DealRecord>,
    followups: Vec<(StoreId, DateTime<Utc>)>,
    unavailable: HashSet<StoreId>,
}

/// In-memory upstream data for tests/dev.
///
/// Stores marked with [`InMemorySignalSource::mark_unavailable`] fail every
/// signal read, simulating an upstream outage for that store.
///
/// Follow-up counts cover the whole follow-up queue, like the Postgres source
/// reading `followup_queue`: entries seeded with
/// [`InMemorySignalSource::add_followup`] (written by other systems) plus the
/// entries of an attached [`InMemoryRecommendationStore`].
#[derive(Debug, Default)]
pub struct InMemorySignalSource {
    inner: RwLock<Tables>,
    followup_queue: Option<Arc<InMemoryRecommendationStore>>,
}

impl InMemorySignalSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count the engine's own queue entries as follow-ups.
    pub fn with_followup_queue(mut self, queue: Arc<InMemoryRecommendationStore>) -> Self {
        self.followup_queue = Some(queue);
        self
    }

    pub fn add_store(&self, store: Store) {
        if let Ok(mut t) = self.inner.write() {
            t.stores.insert(store.id, store);
        }
    }

    pub fn add_order(&self, store_id: StoreId, total: f64, placed_at: DateTime<Utc>) {
        if let Ok(mut t) = self.inner.write() {
            t.orders.push(OrderRecord {
                store_id,
                total,
                placed_at,
            });
        }
    }

    pub fn add_sentiment(&self, store_id: StoreId, score: f64, at: DateTime<Utc>) {
        if let Ok(mut t) = self.inner.write() {
            t.sentiment.push((store_id, score, at));
        }
    }

    pub fn add_deal(&self, deal: DealRecord) {
        if let Ok(mut t) = self.inner.write() {
            t.deals.push(deal);
        }
    }

    pub fn add_followup(&self, store_id: StoreId, at: DateTime<Utc>) {
        if let Ok(mut t) = self.inner.write() {
            t.followups.push((store_id, at));
        }
    }

    pub fn mark_unavailable(&self, store_id: StoreId) {
        if let Ok(mut t) = self.inner.write() {
            t.unavailable.insert(store_id);
        }
    }

    fn read(&self, source_name: &'static str, store_id: StoreId) -> Result<std::sync::RwLockReadGuard<'_, Tables>, UpstreamError> {
        let t = self
            .inner
            .read()
            .map_err(|_| UpstreamError::unavailable(source_name, "lock poisoned"))?;
        if t.unavailable.contains(&store_id) {
            return Err(UpstreamError::unavailable(source_name, format!("store {store_id} unreachable")));
        }
        Ok(t)
    }
}

#[async_trait]
impl SignalSource for InMemorySignalSource {
    async fn orders_since(&self, store_id: StoreId, since: DateTime<Utc>) -> Result<Vec<OrderRecord>, UpstreamError> {
        let t = self.read("orders", store_id)?;
        Ok(t.orders
            .iter()
            .filter(|o| o.store_id == store_id && o.placed_at >= since)
            .cloned()
            .collect())
    }

    async fn sentiment_since(&self, store_id: StoreId, since: DateTime<Utc>) -> Result<Vec<f64>, UpstreamError> {
        let t = self.read("sentiment", store_id)?;
        Ok(t.sentiment
            .iter()
            .filter(|(s, _, at)| *s == store_id && *at >= since)
            .map(|(_, score, _)| *score)
            .collect())
    }

    async fn deals_since(&self, store_id: StoreId, since: DateTime<Utc>) -> Result<Vec<DealRecord>, UpstreamError> {
        let t = self.read("deals", store_id)?;
        Ok(t.deals
            .iter()
            .filter(|d| d.store_id == store_id && d.updated_at >= since)
            .cloned()
            .collect())
    }

    async fn followups_since(&self, store_id: StoreId, since: DateTime<Utc>) -> Result<u32, UpstreamError> {
        let seeded = {
            let t = self.read("followups", store_id)?;
            t.followups.iter().filter(|(s, at)| *s == store_id && *at >= since).count()
        };
        let enqueued = self
            .followup_queue
            .as_ref()
            .map_or(0, |q| q.count_followups_since(store_id, since));
        Ok(u32::try_from(seeded + enqueued).unwrap_or(u32::MAX))
    }
}

#[async_trait]
impl StoreDirectory for InMemorySignalSource {
    async fn get_store(&self, store_id: StoreId) -> Result<Option<Store>, UpstreamError> {
        let t = self
            .inner
            .read()
            .map_err(|_| UpstreamError::unavailable("stores", "lock poisoned"))?;
        Ok(t.stores.get(&store_id).cloned())
    }

    async fn list_scoreable(&self, scope: StoreScope) -> Result<Vec<Store>, UpstreamError> {
        let t = self
            .inner
            .read()
            .map_err(|_| UpstreamError::unavailable("stores", "lock poisoned"))?;
        let mut stores: Vec<Store> = t
            .stores
            .values()
            .filter(|s| s.status.is_scoreable() && scope.matches(s.business_id, s.vertical_id))
            .cloned()
            .collect();
        stores.sort_by_key(|s| s.id);
        Ok(stores)
    }
}
