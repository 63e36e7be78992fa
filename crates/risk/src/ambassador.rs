//! Ambassador inactivity: days since last activity, credited for recent referrals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::assessment::{RiskAssessment, RiskMessage, RiskSource, days_since};
use crate::config::RiskConfig;
use crate::level::RiskLevel;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmbassadorActivity {
    pub ambassador_id: String,
    pub name: String,
    pub last_activity_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub referrals_last_30d: u32,
    #[serde(default = "Utc::now")]
    pub as_of: DateTime<Utc>,
}

pub fn score_ambassador_activity(input: &AmbassadorActivity, config: &RiskConfig) -> RiskAssessment {
    let days_inactive = days_since(input.last_activity_at, input.as_of);
    let credit = input.referrals_last_30d > 0;

    let mut score = config.ambassador_days.score(days_inactive as f64);
    if credit {
        score -= config.referral_credit;
    }

    let source = RiskSource::AmbassadorActivity {
        days_inactive,
        referrals_last_30d: input.referrals_last_30d,
        referral_credit_applied: credit,
    };

    RiskAssessment::build(&input.ambassador_id, score, source, |level| {
        let name = &input.name;
        match level {
            RiskLevel::Critical => RiskMessage {
                headline: format!("{name} has gone inactive"),
                details: format!("No activity for {days_inactive} days."),
                recommended_action: "Call the ambassador now; reassign their territory if unreachable.".to_string(),
            },
            RiskLevel::High => RiskMessage {
                headline: format!("{name} is drifting away"),
                details: format!("No activity for {days_inactive} days."),
                recommended_action: "Schedule a one-on-one this week.".to_string(),
            },
            RiskLevel::Medium => RiskMessage {
                headline: format!("{name} activity is slowing"),
                details: format!("Last activity {days_inactive} days ago."),
                recommended_action: "Send new campaign material.".to_string(),
            },
            RiskLevel::Low => RiskMessage {
                headline: format!("{name} is active"),
                details: format!("Last activity {days_inactive} days ago."),
                recommended_action: "Keep the usual check-in cadence.".to_string(),
            },
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn ambassador(days: Option<i64>, referrals: u32) -> AmbassadorActivity {
        let now = Utc::now();
        AmbassadorActivity {
            ambassador_id: "amb-1".to_string(),
            name: "Riley".to_string(),
            last_activity_at: days.map(|d| now - Duration::days(d)),
            referrals_last_30d: referrals,
            as_of: now,
        }
    }

    #[test]
    fn never_active_is_critical() {
        let a = score_ambassador_activity(&ambassador(None, 0), &RiskConfig::default());
        assert_eq!(a.score, 100);
        assert_eq!(a.level, RiskLevel::Critical);
    }

    #[test]
    fn referrals_reduce_risk_but_not_below_zero() {
        let cfg = RiskConfig::default();
        let idle = score_ambassador_activity(&ambassador(Some(30), 0), &cfg);
        let referring = score_ambassador_activity(&ambassador(Some(30), 3), &cfg);
        assert_eq!(idle.score, 60);
        assert_eq!(referring.score, 50);

        let fresh = score_ambassador_activity(&ambassador(Some(0), 3), &cfg);
        assert_eq!(fresh.score, 0);
    }
}
