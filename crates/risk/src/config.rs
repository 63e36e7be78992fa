use serde::{Deserialize, Serialize};

use crate::level::Bands;

/// Tunable thresholds for every scorer.
///
/// Passed explicitly into each call. The composition root decides whether to
/// use [`RiskConfig::default`] or an overridden copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Days since last order (store churn).
    pub churn_days: Bands,
    /// Added when the store has not been visited for `churn_days.high` days either.
    pub no_visit_boost: f64,

    /// Days past due (invoice non-payment).
    pub overdue_days: Bands,
    pub large_invoice_amount: f64,
    pub very_large_invoice_amount: f64,
    /// Added once per amount threshold exceeded.
    pub amount_boost: f64,

    /// Percent of the reorder point already consumed (inventory low stock).
    pub depletion_pct: Bands,
    /// Denominator used when an item has no usable reorder point.
    pub low_stock_threshold: f64,

    /// Routes in the last 7 days at which a driver counts as overworked.
    pub overwork_route_count: u32,
    pub overwork_saturation_step: f64,
    pub cancellation_penalty: f64,
    pub max_cancellation_penalty: f64,

    /// Days since last activity (ambassador inactivity).
    pub ambassador_days: Bands,
    /// Subtracted when the ambassador produced referrals in the last 30 days.
    pub referral_credit: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            churn_days: Bands::new(14.0, 30.0, 60.0, 1.0),
            no_visit_boost: 10.0,
            overdue_days: Bands::new(7.0, 30.0, 60.0, 0.5),
            large_invoice_amount: 1_000.0,
            very_large_invoice_amount: 5_000.0,
            amount_boost: 10.0,
            depletion_pct: Bands::new(25.0, 50.0, 75.0, 0.8),
            low_stock_threshold: 10.0,
            overwork_route_count: 24,
            overwork_saturation_step: 2.5,
            cancellation_penalty: 8.0,
            max_cancellation_penalty: 30.0,
            ambassador_days: Bands::new(14.0, 30.0, 45.0, 1.0),
            referral_credit: 10.0,
        }
    }
}

impl RiskConfig {
    /// Route-count bands derived from `overwork_route_count` (50% / 75% / 100%).
    pub fn overwork_bands(&self) -> Bands {
        let critical = self.overwork_route_count.max(1) as f64;
        Bands::new(
            critical * 0.5,
            critical * 0.75,
            critical,
            self.overwork_saturation_step,
        )
    }
}
