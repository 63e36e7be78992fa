use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use opsdeck_core::{BusinessId, FollowupId, RecommendationId, SnapshotId, StoreId, VerticalId};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationReason {
    HotStoreRestock,
    ChurnRisk,
    HighValueAtRisk,
    RestockWindow,
    ModerateOpportunity,
}

impl RecommendationReason {
    pub fn as_str(self) -> &'static str {
        match self {
            RecommendationReason::HotStoreRestock => "hot_store_restock",
            RecommendationReason::ChurnRisk => "churn_risk",
            RecommendationReason::HighValueAtRisk => "high_value_at_risk",
            RecommendationReason::RestockWindow => "restock_window",
            RecommendationReason::ModerateOpportunity => "moderate_opportunity",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "hot_store_restock" => Some(RecommendationReason::HotStoreRestock),
            "churn_risk" => Some(RecommendationReason::ChurnRisk),
            "high_value_at_risk" => Some(RecommendationReason::HighValueAtRisk),
            "restock_window" => Some(RecommendationReason::RestockWindow),
            "moderate_opportunity" => Some(RecommendationReason::ModerateOpportunity),
            _ => None,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendedAction {
    AiCall,
    ManualCall,
    AiText,
}

impl RecommendedAction {
    pub fn as_str(self) -> &'static str {
        match self {
            RecommendedAction::AiCall => "ai_call",
            RecommendedAction::ManualCall => "manual_call",
            RecommendedAction::AiText => "ai_text",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ai_call" => Some(RecommendedAction::AiCall),
            "manual_call" => Some(RecommendedAction::ManualCall),
            "ai_text" => Some(RecommendedAction::AiText),
            _ => None,
        }
    }
}

/// A prioritized outreach suggestion derived from one snapshot.
///
/// `synced_to_followup` flips false → true exactly once, at which point
/// `followup_id` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: RecommendationId,
    pub store_id: StoreId,
    pub business_id: BusinessId,
    pub vertical_id: Option<VerticalId>,
    pub snapshot_id: SnapshotId,
    /// 1 (most urgent) ..= 5.
    pub priority: u8,
    pub reason: RecommendationReason,
    pub recommended_action: RecommendedAction,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub synced_to_followup: bool,
    pub followup_id: Option<FollowupId>,
}

impl Recommendation {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_and_action_serialize_snake_case() {
        let json = serde_json::to_string(&RecommendationReason::HighValueAtRisk).unwrap();
        assert_eq!(json, "\"high_value_at_risk\"");
        let json = serde_json::to_string(&RecommendedAction::ManualCall).unwrap();
        assert_eq!(json, "\"manual_call\"");
    }

    #[test]
    fn parse_matches_as_str() {
        for r in [
            RecommendationReason::HotStoreRestock,
            RecommendationReason::ChurnRisk,
            RecommendationReason::HighValueAtRisk,
            RecommendationReason::RestockWindow,
            RecommendationReason::ModerateOpportunity,
        ] {
            assert_eq!(RecommendationReason::parse(r.as_str()), Some(r));
        }
        for a in [RecommendedAction::AiCall, RecommendedAction::ManualCall, RecommendedAction::AiText] {
            assert_eq!(RecommendedAction::parse(a.as_str()), Some(a));
        }
        assert_eq!(RecommendedAction::parse("email"), None);
    }
}
