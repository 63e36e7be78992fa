//! Store churn: how long since the store last ordered (and was visited).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::assessment::{RiskAssessment, RiskMessage, RiskSource, days_since};
use crate::config::RiskConfig;
use crate::level::RiskLevel;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreActivity {
    pub store_id: String,
    pub name: String,
    pub last_order_at: Option<DateTime<Utc>>,
    pub last_visit_at: Option<DateTime<Utc>>,
    #[serde(default = "Utc::now")]
    pub as_of: DateTime<Utc>,
}

pub fn score_store_churn(input: &StoreActivity, config: &RiskConfig) -> RiskAssessment {
    let order_days = days_since(input.last_order_at, input.as_of);
    let visit_days = days_since(input.last_visit_at, input.as_of);

    let mut score = config.churn_days.score(order_days as f64);
    let no_visit = visit_days as f64 >= config.churn_days.high;
    if no_visit {
        score += config.no_visit_boost;
    }

    let source = RiskSource::StoreChurn {
        days_since_last_order: order_days,
        days_since_last_visit: visit_days,
        no_visit_boost_applied: no_visit,
    };

    RiskAssessment::build(&input.store_id, score, source, |level| {
        let name = &input.name;
        match level {
            RiskLevel::Critical => RiskMessage {
                headline: format!("{name} has stopped ordering"),
                details: format!(
                    "No order in {order_days} days and no visit in {visit_days} days. This account is about to be lost."
                ),
                recommended_action: "Call the store owner today and schedule an in-person visit.".to_string(),
            },
            RiskLevel::High => RiskMessage {
                headline: format!("{name} is at high risk of churning"),
                details: format!("Last order was {order_days} days ago, well past the usual cycle."),
                recommended_action: "Reach out this week with a reorder offer.".to_string(),
            },
            RiskLevel::Medium => RiskMessage {
                headline: format!("{name} is ordering less often"),
                details: format!("Last order was {order_days} days ago."),
                recommended_action: "Send a check-in message and confirm stock levels.".to_string(),
            },
            RiskLevel::Low => RiskMessage {
                headline: format!("{name} is ordering regularly"),
                details: format!("Last order was {order_days} days ago."),
                recommended_action: "Keep the regular visit cadence.".to_string(),
            },
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn activity(order_days: Option<i64>, visit_days: Option<i64>) -> StoreActivity {
        let now = Utc::now();
        StoreActivity {
            store_id: "store-1".to_string(),
            name: "Corner Mart".to_string(),
            last_order_at: order_days.map(|d| now - Duration::days(d)),
            last_visit_at: visit_days.map(|d| now - Duration::days(d)),
            as_of: now,
        }
    }

    #[test]
    fn recent_order_is_low_risk() {
        let a = score_store_churn(&activity(Some(3), Some(2)), &RiskConfig::default());
        assert_eq!(a.level, RiskLevel::Low);
        assert!(a.score < 40);
    }

    #[test]
    fn missing_order_date_saturates() {
        let a = score_store_churn(&activity(None, Some(1)), &RiskConfig::default());
        assert_eq!(a.score, 100);
        assert_eq!(a.level, RiskLevel::Critical);
        match a.source_data {
            RiskSource::StoreChurn { days_since_last_order, .. } => assert_eq!(days_since_last_order, 999),
            other => panic!("unexpected source: {other:?}"),
        }
    }

    #[test]
    fn no_visits_boosts_score() {
        let cfg = RiskConfig::default();
        let visited = score_store_churn(&activity(Some(20), Some(5)), &cfg);
        let unvisited = score_store_churn(&activity(Some(20), Some(45)), &cfg);
        assert_eq!(unvisited.score, visited.score + 10);
    }
}
