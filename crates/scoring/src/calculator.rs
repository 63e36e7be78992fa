//! Score calculation: signal bundle → bounded scores, predictions and tags.
//!
//! Every score is clamped into [0, 100] as the last step, regardless of how far
//! intermediate terms overshoot.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::signals::SignalBundle;
use crate::snapshot::{ScoreFields, ScoreTag};

/// Days-since value used when a store has never ordered.
pub const NEVER_ORDERED_DAYS: i64 = 999;

/// Tunable constants of the calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// 30-day revenue is divided by this to get the heat revenue term.
    pub heat_revenue_divisor: f64,
    /// Upper bound of the heat revenue term.
    pub heat_revenue_cap: f64,
    /// Order cycle assumed when the store has fewer than two orders in 90 days.
    pub default_order_cycle_days: f64,
    /// Half-width of the restock window around the predicted order date.
    pub restock_window_days: i64,
    /// 90-day revenue at which a store counts as high value.
    pub high_value_revenue: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            heat_revenue_divisor: 500.0,
            heat_revenue_cap: 20.0,
            default_order_cycle_days: 14.0,
            restock_window_days: 2,
            high_value_revenue: 5_000.0,
        }
    }
}

/// Whole days since the last order, or [`NEVER_ORDERED_DAYS`].
pub fn days_since_last_order(last_order_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> i64 {
    match last_order_at {
        Some(at) => (now - at).num_days().max(0),
        None => NEVER_ORDERED_DAYS,
    }
}

pub fn calculate(bundle: &SignalBundle, config: &ScoringConfig, now: DateTime<Utc>) -> ScoreFields {
    let days = days_since_last_order(bundle.last_order_at, now);
    let communication = clamp_score(bundle.communication_score);
    let sentiment = clamp_sentiment(bundle.sentiment_score);
    let deal_activity = clamp_score(bundle.deal_activity_score);

    let heat = clamp_score(heat_score(bundle, config, days, communication, sentiment, deal_activity));
    let churn = clamp_score(churn_risk(days, communication, sentiment));
    let order_prob = clamp_score(order_probability(bundle.order_count_30d, days, heat, churn));

    let predicted = predict_next_order(bundle, config);
    let window = Duration::days(config.restock_window_days);

    let mut tags = BTreeSet::new();
    if heat >= 80.0 {
        tags.insert(ScoreTag::Hot);
    }
    if churn >= 70.0 {
        tags.insert(ScoreTag::ChurnRisk);
    }
    if bundle.revenue_90d >= config.high_value_revenue {
        tags.insert(ScoreTag::HighValue);
    }
    if order_prob >= 70.0 {
        tags.insert(ScoreTag::LikelyToOrder);
    }
    if sentiment < -20.0 {
        tags.insert(ScoreTag::NegativeSentiment);
    }

    ScoreFields {
        heat_score: heat,
        churn_risk: churn,
        order_prob_7d: order_prob,
        avg_order_value: bundle.avg_order_value,
        revenue_30d: bundle.revenue_30d,
        revenue_90d: bundle.revenue_90d,
        order_count_30d: bundle.order_count_30d,
        order_count_90d: bundle.order_count_90d,
        last_order_at: bundle.last_order_at,
        days_since_last_order: days,
        predicted_next_order_at: predicted,
        restock_window_start: predicted.map(|p| p - window),
        restock_window_end: predicted.map(|p| p + window),
        communication_score: communication,
        sentiment_score: sentiment,
        deal_activity_score: deal_activity,
        follow_up_intensity: clamp_score(bundle.follow_up_intensity),
        tags,
    }
}

fn heat_score(
    bundle: &SignalBundle,
    config: &ScoringConfig,
    days: i64,
    communication: f64,
    sentiment: f64,
    deal_activity: f64,
) -> f64 {
    let revenue = if config.heat_revenue_divisor > 0.0 {
        (bundle.revenue_30d.max(0.0) / config.heat_revenue_divisor).min(config.heat_revenue_cap)
    } else {
        0.0
    };

    let recency = match days {
        d if d < 7 => 15.0,
        d if d < 14 => 10.0,
        d if d < 30 => 5.0,
        _ => 0.0,
    };

    // [-100, 100] -> [0, 10]
    let sentiment_term = (sentiment + 100.0) / 200.0 * 10.0;

    50.0 + revenue + recency + communication * 0.1 + sentiment_term + deal_activity * 0.1
}

fn churn_risk(days: i64, communication: f64, sentiment: f64) -> f64 {
    let recency = match days {
        d if d > 60 => 40.0,
        d if d > 30 => 25.0,
        d if d > 14 => 10.0,
        _ => 0.0,
    };

    let sentiment_penalty = if sentiment < -30.0 {
        20.0
    } else if sentiment < 0.0 {
        10.0
    } else {
        0.0
    };

    20.0 + recency + sentiment_penalty - communication * 0.2
}

fn order_probability(order_count_30d: u32, days: i64, heat: f64, churn: f64) -> f64 {
    let base = if order_count_30d > 0 {
        let interval = 30.0 / order_count_30d as f64;
        if days as f64 >= interval * 0.8 { 70.0 } else { 40.0 }
    } else {
        30.0
    };
    base + heat * 0.2 - churn * 0.3
}

fn predict_next_order(bundle: &SignalBundle, config: &ScoringConfig) -> Option<DateTime<Utc>> {
    let last = bundle.last_order_at?;
    let cycle_days = if bundle.order_count_90d >= 2 {
        90.0 / bundle.order_count_90d as f64
    } else {
        config.default_order_cycle_days
    };
    let cycle = Duration::seconds((cycle_days * 86_400.0).round() as i64);
    Some(last + cycle)
}

fn clamp_score(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 100.0) }
}

fn clamp_sentiment(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(-100.0, 100.0) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::{deal_activity_score, follow_up_intensity};
    use opsdeck_core::StoreId;
    use proptest::prelude::*;

    fn bundle() -> SignalBundle {
        SignalBundle::empty(StoreId::new(), 20.0)
    }

    #[test]
    fn active_high_revenue_store_is_hot() {
        let now = Utc::now();
        let mut b = bundle();
        b.revenue_30d = 3_000.0;
        b.revenue_90d = 3_000.0;
        b.order_count_30d = 3;
        b.order_count_90d = 3;
        b.last_order_at = Some(now - Duration::days(2));
        b.communication_score = 70.0;
        b.sentiment_score = 40.0;
        b.deal_activity_score = 50.0;

        let f = calculate(&b, &ScoringConfig::default(), now);

        assert_eq!(f.days_since_last_order, 2);
        assert!((70.0..100.0).contains(&f.heat_score), "heat = {}", f.heat_score);
        assert!((f.heat_score - 90.0).abs() < 1e-9);
        assert!(f.has_tag(ScoreTag::Hot));
        assert!(!f.has_tag(ScoreTag::ChurnRisk));
    }

    #[test]
    fn lapsed_unhappy_store_is_churn_risk() {
        let now = Utc::now();
        let mut b = bundle();
        b.last_order_at = Some(now - Duration::days(75));
        b.sentiment_score = -50.0;

        let f = calculate(&b, &ScoringConfig::default(), now);

        assert_eq!(f.days_since_last_order, 75);
        assert!(f.churn_risk >= 70.0, "churn = {}", f.churn_risk);
        assert!(f.has_tag(ScoreTag::ChurnRisk));
        assert!(f.has_tag(ScoreTag::NegativeSentiment));
    }

    #[test]
    fn never_ordered_uses_sentinel_and_max_recency_band() {
        let now = Utc::now();
        let f = calculate(&bundle(), &ScoringConfig::default(), now);

        assert_eq!(f.days_since_last_order, NEVER_ORDERED_DAYS);
        // 20 baseline + 40 recency - 0.2 * 20 communication
        assert!((f.churn_risk - 56.0).abs() < 1e-9);
        assert_eq!(f.predicted_next_order_at, None);
        assert_eq!(f.restock_window_start, None);
        assert_eq!(f.restock_window_end, None);
    }

    #[test]
    fn prediction_uses_observed_cycle_with_two_or_more_orders() {
        let now = Utc::now();
        let last = now - Duration::days(3);
        let mut b = bundle();
        b.last_order_at = Some(last);
        b.order_count_90d = 6;

        let f = calculate(&b, &ScoringConfig::default(), now);

        assert_eq!(f.predicted_next_order_at, Some(last + Duration::days(15)));
        assert_eq!(f.restock_window_start, Some(last + Duration::days(13)));
        assert_eq!(f.restock_window_end, Some(last + Duration::days(17)));
    }

    #[test]
    fn prediction_falls_back_to_default_cycle() {
        let now = Utc::now();
        let last = now - Duration::days(3);
        let mut b = bundle();
        b.last_order_at = Some(last);
        b.order_count_90d = 1;

        let f = calculate(&b, &ScoringConfig::default(), now);
        assert_eq!(f.predicted_next_order_at, Some(last + Duration::days(14)));
    }

    #[test]
    fn order_probability_rises_when_cycle_is_due() {
        let now = Utc::now();
        let mut due = bundle();
        due.order_count_30d = 3; // 10-day interval, due at 8 days
        due.last_order_at = Some(now - Duration::days(9));
        let mut early = due.clone();
        early.last_order_at = Some(now - Duration::days(2));

        let cfg = ScoringConfig::default();
        let due_f = calculate(&due, &cfg, now);
        let early_f = calculate(&early, &cfg, now);

        let due_base = due_f.order_prob_7d - 0.2 * due_f.heat_score + 0.3 * due_f.churn_risk;
        let early_base = early_f.order_prob_7d - 0.2 * early_f.heat_score + 0.3 * early_f.churn_risk;
        assert!((due_base - 70.0).abs() < 1e-9);
        assert!((early_base - 40.0).abs() < 1e-9);
    }

    fn arb_bundle() -> impl Strategy<Value = SignalBundle> {
        (
            -1.0e6f64..1.0e7,
            0u32..500,
            0u32..500,
            proptest::option::of(-400i64..4_000),
            -500.0f64..500.0,
            0u32..50,
            0u32..50,
            0u32..50,
            -200.0f64..300.0,
        )
            .prop_map(|(revenue, c30, c90, last_days, sentiment, open, won, followups, comm)| {
                let now = Utc::now();
                let mut b = SignalBundle::empty(StoreId::new(), comm);
                b.revenue_30d = revenue;
                b.revenue_90d = revenue * 2.0;
                b.order_count_30d = c30;
                b.order_count_90d = c90;
                b.last_order_at = last_days.map(|d| now - Duration::days(d));
                b.sentiment_score = sentiment;
                b.open_deals_90d = open;
                b.won_deals_90d = won;
                b.deal_activity_score = deal_activity_score(open, won);
                b.followups_30d = followups;
                b.follow_up_intensity = follow_up_intensity(followups);
                b
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: every score lands in [0, 100] for any bundle.
        #[test]
        fn scores_are_bounded(b in arb_bundle()) {
            let f = calculate(&b, &ScoringConfig::default(), Utc::now());
            for v in [f.heat_score, f.churn_risk, f.order_prob_7d, f.communication_score,
                      f.deal_activity_score, f.follow_up_intensity] {
                prop_assert!((0.0..=100.0).contains(&v), "out of range: {v}");
            }
            prop_assert!((-100.0..=100.0).contains(&f.sentiment_score));
            prop_assert!(f.days_since_last_order >= 0);
        }
    }
}
