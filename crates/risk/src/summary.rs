use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::assessment::{RiskAssessment, RiskType};
use crate::level::RiskLevel;

/// Tally of assessments by level and by type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskSummary {
    pub total: usize,
    pub by_level: BTreeMap<RiskLevel, usize>,
    pub by_type: BTreeMap<RiskType, usize>,
    pub critical: usize,
    pub high: usize,
}

/// Pure reduction over `(level, type)` pairs.
pub fn compute_risk_summary(items: &[(RiskLevel, RiskType)]) -> RiskSummary {
    let mut summary = RiskSummary::default();
    for &(level, risk_type) in items {
        summary.total += 1;
        *summary.by_level.entry(level).or_insert(0) += 1;
        *summary.by_type.entry(risk_type).or_insert(0) += 1;
        match level {
            RiskLevel::Critical => summary.critical += 1,
            RiskLevel::High => summary.high += 1,
            RiskLevel::Medium | RiskLevel::Low => {}
        }
    }
    summary
}

impl RiskSummary {
    pub fn from_assessments<'a>(assessments: impl IntoIterator<Item = &'a RiskAssessment>) -> Self {
        let pairs: Vec<(RiskLevel, RiskType)> = assessments
            .into_iter()
            .map(|a| (a.level, a.risk_type))
            .collect();
        compute_risk_summary(&pairs)
    }
}
