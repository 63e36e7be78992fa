use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use opsdeck_core::{BusinessId, SnapshotId, StoreId, VerticalId};

/// Label attached to a snapshot when a score crosses its threshold.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreTag {
    Hot,
    ChurnRisk,
    HighValue,
    LikelyToOrder,
    NegativeSentiment,
}

impl ScoreTag {
    pub fn as_str(self) -> &'static str {
        match self {
            ScoreTag::Hot => "hot",
            ScoreTag::ChurnRisk => "churn_risk",
            ScoreTag::HighValue => "high_value",
            ScoreTag::LikelyToOrder => "likely_to_order",
            ScoreTag::NegativeSentiment => "negative_sentiment",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "hot" => Some(ScoreTag::Hot),
            "churn_risk" => Some(ScoreTag::ChurnRisk),
            "high_value" => Some(ScoreTag::HighValue),
            "likely_to_order" => Some(ScoreTag::LikelyToOrder),
            "negative_sentiment" => Some(ScoreTag::NegativeSentiment),
            _ => None,
        }
    }
}

/// Every computed field of a snapshot (the unsaved calculator output).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreFields {
    pub heat_score: f64,
    pub churn_risk: f64,
    pub order_prob_7d: f64,
    pub avg_order_value: f64,
    pub revenue_30d: f64,
    pub revenue_90d: f64,
    pub order_count_30d: u32,
    pub order_count_90d: u32,
    pub last_order_at: Option<DateTime<Utc>>,
    pub days_since_last_order: i64,
    pub predicted_next_order_at: Option<DateTime<Utc>>,
    pub restock_window_start: Option<DateTime<Utc>>,
    pub restock_window_end: Option<DateTime<Utc>>,
    pub communication_score: f64,
    pub sentiment_score: f64,
    pub deal_activity_score: f64,
    pub follow_up_intensity: f64,
    pub tags: BTreeSet<ScoreTag>,
}

impl ScoreFields {
    pub fn has_tag(&self, tag: ScoreTag) -> bool {
        self.tags.contains(&tag)
    }
}

/// One row per (store, calendar date).
///
/// Re-scoring the same store on the same date replaces `fields` and
/// `computed_at`; the row `id` is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSnapshot {
    pub id: SnapshotId,
    pub store_id: StoreId,
    pub business_id: BusinessId,
    pub vertical_id: Option<VerticalId>,
    pub snapshot_date: NaiveDate,
    pub computed_at: DateTime<Utc>,
    #[serde(flatten)]
    pub fields: ScoreFields,
}
