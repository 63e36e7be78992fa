use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::level::{RiskLevel, clamp_score};

/// Sentinel used when a "days since" signal has no reference date.
pub const MISSING_DAYS: i64 = 999;

/// The closed set of risk types the library can assess.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskType {
    StoreChurn,
    InvoicePayment,
    InventoryStock,
    DriverWorkload,
    AmbassadorActivity,
}

impl RiskType {
    pub fn as_str(self) -> &'static str {
        match self {
            RiskType::StoreChurn => "store_churn",
            RiskType::InvoicePayment => "invoice_payment",
            RiskType::InventoryStock => "inventory_stock",
            RiskType::DriverWorkload => "driver_workload",
            RiskType::AmbassadorActivity => "ambassador_activity",
        }
    }
}

/// Structured echo of the signals a scorer used, one shape per risk type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "risk_type", rename_all = "snake_case")]
pub enum RiskSource {
    StoreChurn {
        days_since_last_order: i64,
        days_since_last_visit: i64,
        no_visit_boost_applied: bool,
    },
    InvoicePayment {
        days_overdue: i64,
        amount: f64,
        amount_boost: f64,
        paid: bool,
    },
    InventoryStock {
        quantity: i64,
        reorder_point: i64,
        /// Denominator actually used (falls back when the reorder point is not positive).
        effective_reorder_point: f64,
        depletion_pct: f64,
    },
    DriverWorkload {
        routes_last_7d: u32,
        consecutive_cancellations: u32,
        cancellation_penalty: f64,
    },
    AmbassadorActivity {
        days_inactive: i64,
        referrals_last_30d: u32,
        referral_credit_applied: bool,
    },
}

impl RiskSource {
    pub fn risk_type(&self) -> RiskType {
        match self {
            RiskSource::StoreChurn { .. } => RiskType::StoreChurn,
            RiskSource::InvoicePayment { .. } => RiskType::InvoicePayment,
            RiskSource::InventoryStock { .. } => RiskType::InventoryStock,
            RiskSource::DriverWorkload { .. } => RiskType::DriverWorkload,
            RiskSource::AmbassadorActivity { .. } => RiskType::AmbassadorActivity,
        }
    }
}

/// Output of every scorer. Computed fresh on each call, never persisted here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub risk_type: RiskType,
    /// Identifier of the assessed subject (store, invoice, item, driver, ambassador).
    pub subject_id: String,
    pub score: u8,
    pub level: RiskLevel,
    pub headline: String,
    pub details: String,
    pub recommended_action: String,
    pub source_data: RiskSource,
}

/// Level-specific copy produced by each scorer.
pub(crate) struct RiskMessage {
    pub headline: String,
    pub details: String,
    pub recommended_action: String,
}

impl RiskAssessment {
    pub(crate) fn build(
        subject_id: impl Into<String>,
        raw_score: f64,
        source_data: RiskSource,
        message: impl FnOnce(RiskLevel) -> RiskMessage,
    ) -> Self {
        let score = clamp_score(raw_score).round() as u8;
        let level = RiskLevel::from_score(score as f64);
        let RiskMessage {
            headline,
            details,
            recommended_action,
        } = message(level);

        Self {
            risk_type: source_data.risk_type(),
            subject_id: subject_id.into(),
            score,
            level,
            headline,
            details,
            recommended_action,
            source_data,
        }
    }
}

/// Whole days elapsed since `at`, floored and never negative.
///
/// A missing date yields [`MISSING_DAYS`] so it reads as the maximal signal.
pub(crate) fn days_since(at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> i64 {
    match at {
        Some(at) => (now - at).num_days().max(0),
        None => MISSING_DAYS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn days_since_floors_partial_days() {
        let now = Utc::now();
        assert_eq!(days_since(Some(now - Duration::hours(47)), now), 1);
        assert_eq!(days_since(Some(now + Duration::days(3)), now), 0);
        assert_eq!(days_since(None, now), MISSING_DAYS);
    }

    #[test]
    fn source_data_serializes_with_type_tag() {
        let src = RiskSource::DriverWorkload {
            routes_last_7d: 20,
            consecutive_cancellations: 1,
            cancellation_penalty: 8.0,
        };
        let json = serde_json::to_value(&src).unwrap();
        assert_eq!(json["risk_type"], "driver_workload");
        assert_eq!(json["routes_last_7d"], 20);
    }
}
