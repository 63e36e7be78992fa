//! Signal collection: windowed aggregates for one store.
//!
//! Upstream sources (orders, interaction analytics, deals, follow-ups) are read
//! through [`SignalSource`]. An empty window is a neutral signal, not an error;
//! only a failed read is surfaced as [`UpstreamError`].

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use opsdeck_core::StoreId;

use crate::store::Store;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    #[error("upstream source `{source_name}` unavailable: {message}")]
    Unavailable {
        source_name: &'static str,
        message: String,
    },
}

impl UpstreamError {
    pub fn unavailable(source_name: &'static str, message: impl Into<String>) -> Self {
        Self::Unavailable {
            source_name,
            message: message.into(),
        }
    }
}

/// A completed order/invoice attributed to a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub store_id: StoreId,
    pub total: f64,
    pub placed_at: DateTime<Utc>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DealStage {
    Open,
    Negotiating,
    Won,
    Lost,
}

impl DealStage {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "open" => Some(DealStage::Open),
            "negotiating" => Some(DealStage::Negotiating),
            "won" => Some(DealStage::Won),
            "lost" => Some(DealStage::Lost),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealRecord {
    pub store_id: StoreId,
    pub stage: DealStage,
    pub updated_at: DateTime<Utc>,
}

/// Read-only access to upstream transactional data, by store and window start.
#[async_trait]
pub trait SignalSource: Send + Sync {
    async fn orders_since(
        &self,
        store_id: StoreId,
        since: DateTime<Utc>,
    ) -> Result<Vec<OrderRecord>, UpstreamError>;

    /// Sentiment scores in [-100, 100] from interaction analytics.
    async fn sentiment_since(
        &self,
        store_id: StoreId,
        since: DateTime<Utc>,
    ) -> Result<Vec<f64>, UpstreamError>;

    async fn deals_since(
        &self,
        store_id: StoreId,
        since: DateTime<Utc>,
    ) -> Result<Vec<DealRecord>, UpstreamError>;

    /// Number of follow-up records created since `since`.
    async fn followups_since(
        &self,
        store_id: StoreId,
        since: DateTime<Utc>,
    ) -> Result<u32, UpstreamError>;
}

/// Window lengths, in days.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalWindows {
    /// Revenue/order window and follow-up window.
    pub short_days: i64,
    /// Long revenue/order window and deal window.
    pub long_days: i64,
    /// Sentiment window.
    pub recent_days: i64,
}

impl Default for SignalWindows {
    fn default() -> Self {
        Self {
            short_days: 30,
            long_days: 90,
            recent_days: 7,
        }
    }
}

/// Flat signal bundle for one store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalBundle {
    pub store_id: StoreId,
    pub revenue_30d: f64,
    pub revenue_90d: f64,
    pub order_count_30d: u32,
    pub order_count_90d: u32,
    pub avg_order_value: f64,
    pub last_order_at: Option<DateTime<Utc>>,
    /// Mean sentiment in [-100, 100]; 0 when there were no interactions.
    pub sentiment_score: f64,
    pub open_deals_90d: u32,
    pub won_deals_90d: u32,
    pub deal_activity_score: f64,
    pub followups_30d: u32,
    pub follow_up_intensity: f64,
    pub communication_score: f64,
}

impl SignalBundle {
    /// A bundle with no activity at all, for a store with the given communication score.
    pub fn empty(store_id: StoreId, communication_score: f64) -> Self {
        Self {
            store_id,
            revenue_30d: 0.0,
            revenue_90d: 0.0,
            order_count_30d: 0,
            order_count_90d: 0,
            avg_order_value: 0.0,
            last_order_at: None,
            sentiment_score: 0.0,
            open_deals_90d: 0,
            won_deals_90d: 0,
            deal_activity_score: 0.0,
            followups_30d: 0,
            follow_up_intensity: 0.0,
            communication_score,
        }
    }
}

/// `min(100, 15 * open + 25 * won)`
pub fn deal_activity_score(open: u32, won: u32) -> f64 {
    (15.0 * open as f64 + 25.0 * won as f64).min(100.0)
}

/// `min(100, 10 * followups)`
pub fn follow_up_intensity(followups: u32) -> f64 {
    (10.0 * followups as f64).min(100.0)
}

/// Collects a [`SignalBundle`] for one store. Never mutates upstream state.
pub struct SignalCollector<'a, S: ?Sized> {
    source: &'a S,
    windows: SignalWindows,
}

impl<'a, S> SignalCollector<'a, S>
where
    S: SignalSource + ?Sized,
{
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            windows: SignalWindows::default(),
        }
    }

    pub fn with_windows(mut self, windows: SignalWindows) -> Self {
        self.windows = windows;
        self
    }

    pub async fn collect(&self, store: &Store, now: DateTime<Utc>) -> Result<SignalBundle, UpstreamError> {
        let short_start = now - Duration::days(self.windows.short_days);
        let long_start = now - Duration::days(self.windows.long_days);
        let recent_start = now - Duration::days(self.windows.recent_days);

        let mut bundle = SignalBundle::empty(store.id, store.status.communication_score());

        let orders = self.source.orders_since(store.id, long_start).await?;
        if orders.is_empty() {
            info!(store_id = %store.id, source = "orders", "no rows in window; using neutral signal");
        }
        for order in &orders {
            bundle.revenue_90d += order.total;
            bundle.order_count_90d += 1;
            if order.placed_at >= short_start {
                bundle.revenue_30d += order.total;
                bundle.order_count_30d += 1;
            }
        }
        bundle.avg_order_value = if bundle.order_count_90d > 0 {
            bundle.revenue_90d / bundle.order_count_90d as f64
        } else {
            0.0
        };

        // The master record may know about orders older than the long window.
        let newest_in_window = orders.iter().map(|o| o.placed_at).max();
        bundle.last_order_at = match (newest_in_window, store.last_order_at) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };

        let sentiments = self.source.sentiment_since(store.id, recent_start).await?;
        if sentiments.is_empty() {
            info!(store_id = %store.id, source = "sentiment", "no rows in window; using neutral signal");
        } else {
            let mean = sentiments.iter().sum::<f64>() / sentiments.len() as f64;
            bundle.sentiment_score = mean.clamp(-100.0, 100.0);
        }

        let deals = self.source.deals_since(store.id, long_start).await?;
        if deals.is_empty() {
            info!(store_id = %store.id, source = "deals", "no rows in window; using neutral signal");
        }
        for deal in &deals {
            match deal.stage {
                DealStage::Open | DealStage::Negotiating => bundle.open_deals_90d += 1,
                DealStage::Won => bundle.won_deals_90d += 1,
                DealStage::Lost => {}
            }
        }
        bundle.deal_activity_score = deal_activity_score(bundle.open_deals_90d, bundle.won_deals_90d);

        bundle.followups_30d = self.source.followups_since(store.id, short_start).await?;
        bundle.follow_up_intensity = follow_up_intensity(bundle.followups_30d);

        debug!(
            store_id = %store.id,
            orders_90d = bundle.order_count_90d,
            revenue_30d = bundle.revenue_30d,
            sentiment = bundle.sentiment_score,
            "signals collected"
        );
        Ok(bundle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::LifecycleStatus;
    use opsdeck_core::BusinessId;

    struct FixedSource {
        orders: Vec<OrderRecord>,
        sentiment: Vec<f64>,
        deals: Vec<DealRecord>,
        followups: u32,
    }

    #[async_trait]
    impl SignalSource for FixedSource {
        async fn orders_since(&self, store_id: StoreId, since: DateTime<Utc>) -> Result<Vec<OrderRecord>, UpstreamError> {
            Ok(self
                .orders
                .iter()
                .filter(|o| o.store_id == store_id && o.placed_at >= since)
                .cloned()
                .collect())
        }

        async fn sentiment_since(&self, _store_id: StoreId, _since: DateTime<Utc>) -> Result<Vec<f64>, UpstreamError> {
            Ok(self.sentiment.clone())
        }

        async fn deals_since(&self, _store_id: StoreId, _since: DateTime<Utc>) -> Result<Vec<DealRecord>, UpstreamError> {
            Ok(self.deals.clone())
        }

        async fn followups_since(&self, _store_id: StoreId, _since: DateTime<Utc>) -> Result<u32, UpstreamError> {
            Ok(self.followups)
        }
    }

    fn store(status: LifecycleStatus) -> Store {
        Store {
            id: StoreId::new(),
            business_id: BusinessId::new(),
            vertical_id: None,
            name: "Main St Deli".to_string(),
            status,
            last_order_at: None,
            last_visit_at: None,
        }
    }

    #[tokio::test]
    async fn aggregates_windows_and_deals() {
        let now = Utc::now();
        let s = store(LifecycleStatus::Active);
        let order = |days: i64, total: f64| OrderRecord {
            store_id: s.id,
            total,
            placed_at: now - Duration::days(days),
        };
        let deal = |stage| DealRecord {
            store_id: s.id,
            stage,
            updated_at: now,
        };
        let source = FixedSource {
            orders: vec![order(5, 100.0), order(20, 300.0), order(60, 600.0), order(120, 999.0)],
            sentiment: vec![40.0, -20.0],
            deals: vec![deal(DealStage::Open), deal(DealStage::Negotiating), deal(DealStage::Won), deal(DealStage::Lost)],
            followups: 3,
        };

        let bundle = SignalCollector::new(&source).collect(&s, now).await.unwrap();

        assert_eq!(bundle.order_count_30d, 2);
        assert_eq!(bundle.revenue_30d, 400.0);
        assert_eq!(bundle.order_count_90d, 3);
        assert_eq!(bundle.revenue_90d, 1000.0);
        assert!((bundle.avg_order_value - 1000.0 / 3.0).abs() < 1e-9);
        assert_eq!(bundle.last_order_at, Some(now - Duration::days(5)));
        assert_eq!(bundle.sentiment_score, 10.0);
        assert_eq!(bundle.open_deals_90d, 2);
        assert_eq!(bundle.won_deals_90d, 1);
        assert_eq!(bundle.deal_activity_score, 55.0);
        assert_eq!(bundle.follow_up_intensity, 30.0);
        assert_eq!(bundle.communication_score, 80.0);
    }

    #[tokio::test]
    async fn empty_sources_are_neutral() {
        let now = Utc::now();
        let mut s = store(LifecycleStatus::Prospect);
        s.last_order_at = Some(now - Duration::days(200));
        let source = FixedSource {
            orders: vec![],
            sentiment: vec![],
            deals: vec![],
            followups: 0,
        };

        let bundle = SignalCollector::new(&source).collect(&s, now).await.unwrap();

        assert_eq!(bundle.avg_order_value, 0.0);
        assert_eq!(bundle.sentiment_score, 0.0);
        assert_eq!(bundle.deal_activity_score, 0.0);
        assert_eq!(bundle.communication_score, 50.0);
        assert_eq!(bundle.last_order_at, s.last_order_at);
    }
}
