use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use opsdeck_core::{FollowupId, RecommendationId, SnapshotId, StoreId, VerticalId};

use crate::recommendation::{Recommendation, RecommendationReason, RecommendedAction};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowupStatus {
    Pending,
}

impl FollowupStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            FollowupStatus::Pending => "pending",
        }
    }
}

/// Context carried to the outreach system alongside the queue row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowupContext {
    pub recommendation_id: RecommendationId,
    pub snapshot_id: SnapshotId,
    pub reason: RecommendationReason,
    pub notes: String,
    pub brand_id: Option<VerticalId>,
}

/// Row in the downstream follow-up queue. One per recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowupEntry {
    pub id: FollowupId,
    pub store_id: StoreId,
    pub recommendation_id: RecommendationId,
    pub reason: RecommendationReason,
    pub recommended_action: RecommendedAction,
    pub priority: u8,
    pub context: FollowupContext,
    pub due_at: DateTime<Utc>,
    pub status: FollowupStatus,
    pub created_at: DateTime<Utc>,
}

impl FollowupEntry {
    pub fn for_recommendation(rec: &Recommendation, now: DateTime<Utc>) -> Self {
        let due_in = if rec.priority <= 2 {
            Duration::hours(24)
        } else {
            Duration::hours(48)
        };

        Self {
            id: FollowupId::new(),
            store_id: rec.store_id,
            recommendation_id: rec.id,
            reason: rec.reason,
            recommended_action: rec.recommended_action,
            priority: rec.priority,
            context: FollowupContext {
                recommendation_id: rec.id,
                snapshot_id: rec.snapshot_id,
                reason: rec.reason,
                notes: rec.notes.clone(),
                brand_id: rec.vertical_id,
            },
            due_at: now + due_in,
            status: FollowupStatus::Pending,
            created_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opsdeck_core::BusinessId;

    fn rec(priority: u8) -> Recommendation {
        let now = Utc::now();
        Recommendation {
            id: RecommendationId::new(),
            store_id: StoreId::new(),
            business_id: BusinessId::new(),
            vertical_id: Some(VerticalId::new()),
            snapshot_id: SnapshotId::new(),
            priority,
            reason: RecommendationReason::ChurnRisk,
            recommended_action: RecommendedAction::ManualCall,
            notes: "call them".to_string(),
            created_at: now,
            expires_at: now + Duration::days(7),
            synced_to_followup: false,
            followup_id: None,
        }
    }

    #[test]
    fn urgent_priorities_are_due_next_day() {
        let now = Utc::now();
        for p in [1, 2] {
            let entry = FollowupEntry::for_recommendation(&rec(p), now);
            assert_eq!(entry.due_at, now + Duration::hours(24));
        }
        let entry = FollowupEntry::for_recommendation(&rec(3), now);
        assert_eq!(entry.due_at, now + Duration::hours(48));
    }

    #[test]
    fn context_carries_reason_notes_and_brand() {
        let r = rec(1);
        let entry = FollowupEntry::for_recommendation(&r, Utc::now());
        assert_eq!(entry.recommendation_id, r.id);
        assert_eq!(entry.status, FollowupStatus::Pending);
        assert_eq!(entry.context.reason, r.reason);
        assert_eq!(entry.context.notes, r.notes);
        assert_eq!(entry.context.brand_id, r.vertical_id);

        let json = serde_json::to_value(&entry.context).unwrap();
        assert_eq!(json["reason"], "churn_risk");
    }
}
