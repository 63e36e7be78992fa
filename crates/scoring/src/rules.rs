//! Ordered recommendation rule table.
//!
//! Rules are evaluated top to bottom; the first match decides the
//! recommendation. A snapshot matching none yields no recommendation.

use chrono::{DateTime, Duration, Utc};

use opsdeck_core::RecommendationId;

use crate::recommendation::{Recommendation, RecommendationReason, RecommendedAction};
use crate::snapshot::{ScoreSnapshot, ScoreTag};

/// How long a recommendation stays actionable.
pub const RECOMMENDATION_TTL_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy)]
pub struct RecommendationRule {
    pub reason: RecommendationReason,
    pub priority: u8,
    pub action: RecommendedAction,
    pub matches: fn(&ScoreSnapshot, DateTime<Utc>) -> bool,
}

fn hot_store(s: &ScoreSnapshot, _now: DateTime<Utc>) -> bool {
    s.fields.heat_score >= 80.0 && s.fields.order_prob_7d >= 60.0
}

fn churning(s: &ScoreSnapshot, _now: DateTime<Utc>) -> bool {
    s.fields.churn_risk >= 70.0
}

/// High value is whatever the calculator tagged, so the rule follows
/// `ScoringConfig::high_value_revenue`.
fn high_value_at_risk(s: &ScoreSnapshot, _now: DateTime<Utc>) -> bool {
    s.fields.has_tag(ScoreTag::HighValue) && s.fields.churn_risk >= 50.0
}

fn in_restock_window(s: &ScoreSnapshot, now: DateTime<Utc>) -> bool {
    s.fields.restock_window_start.is_some_and(|start| start <= now)
}

fn warm(s: &ScoreSnapshot, _now: DateTime<Utc>) -> bool {
    s.fields.heat_score >= 60.0
}

pub static RULES: [RecommendationRule; 5] = [
    RecommendationRule {
        reason: RecommendationReason::HotStoreRestock,
        priority: 1,
        action: RecommendedAction::AiCall,
        matches: hot_store,
    },
    RecommendationRule {
        reason: RecommendationReason::ChurnRisk,
        priority: 1,
        action: RecommendedAction::ManualCall,
        matches: churning,
    },
    RecommendationRule {
        reason: RecommendationReason::HighValueAtRisk,
        priority: 2,
        action: RecommendedAction::ManualCall,
        matches: high_value_at_risk,
    },
    RecommendationRule {
        reason: RecommendationReason::RestockWindow,
        priority: 2,
        action: RecommendedAction::AiText,
        matches: in_restock_window,
    },
    RecommendationRule {
        reason: RecommendationReason::ModerateOpportunity,
        priority: 3,
        action: RecommendedAction::AiText,
        matches: warm,
    },
];

pub fn first_match(snapshot: &ScoreSnapshot, now: DateTime<Utc>) -> Option<&'static RecommendationRule> {
    RULES.iter().find(|rule| (rule.matches)(snapshot, now))
}

/// Build the recommendation for `snapshot`, if any rule fires.
pub fn recommend(snapshot: &ScoreSnapshot, now: DateTime<Utc>) -> Option<Recommendation> {
    let rule = first_match(snapshot, now)?;
    Some(Recommendation {
        id: RecommendationId::new(),
        store_id: snapshot.store_id,
        business_id: snapshot.business_id,
        vertical_id: snapshot.vertical_id,
        snapshot_id: snapshot.id,
        priority: rule.priority,
        reason: rule.reason,
        recommended_action: rule.action,
        notes: notes_for(rule.reason, snapshot),
        created_at: now,
        expires_at: now + Duration::days(RECOMMENDATION_TTL_DAYS),
        synced_to_followup: false,
        followup_id: None,
    })
}

fn notes_for(reason: RecommendationReason, s: &ScoreSnapshot) -> String {
    let f = &s.fields;
    match reason {
        RecommendationReason::HotStoreRestock => format!(
            "Hot store (heat {:.0}) with {:.0}% chance to order this week. Call to take the restock order.",
            f.heat_score, f.order_prob_7d
        ),
        RecommendationReason::ChurnRisk => format!(
            "Churn risk {:.0}: {} days since last order. Call personally to re-engage.",
            f.churn_risk, f.days_since_last_order
        ),
        RecommendationReason::HighValueAtRisk => format!(
            "High-value store (${:.0} in 90 days) showing churn risk {:.0}. Check in before it lapses.",
            f.revenue_90d, f.churn_risk
        ),
        RecommendationReason::RestockWindow => match f.restock_window_end {
            Some(end) => format!(
                "Restock window open until {}. Send a reorder reminder.",
                end.format("%Y-%m-%d")
            ),
            None => "Restock window open. Send a reorder reminder.".to_string(),
        },
        RecommendationReason::ModerateOpportunity => format!(
            "Warm store (heat {:.0}). Send a check-in message.",
            f.heat_score
        ),
    }
}
