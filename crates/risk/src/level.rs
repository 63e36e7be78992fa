//! Shared banding: signal → score curve, and score → level table.

use serde::{Deserialize, Serialize};

/// Coarse risk label derived from a 0–100 score.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// `>=80` critical, `>=60` high, `>=40` medium, else low.
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            RiskLevel::Critical
        } else if score >= 60.0 {
            RiskLevel::High
        } else if score >= 40.0 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    /// Inverse of [`RiskLevel::from_score`], used when an assessment has been
    /// reduced to its level and needs a score again (e.g. aggregation).
    pub fn representative_score(self) -> u8 {
        match self {
            RiskLevel::Critical => 90,
            RiskLevel::High => 70,
            RiskLevel::Medium => 50,
            RiskLevel::Low => 20,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

impl core::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Thresholds of the piecewise-linear banding curve.
///
/// ```text
///   [0, low)           ->  0 .. 40
///   [low, high)        -> 40 .. 60
///   [high, critical)   -> 60 .. 80
///   [critical, ..)     -> 80 + (value - critical) * saturation_step, capped at 100
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bands {
    pub low: f64,
    pub high: f64,
    pub critical: f64,
    /// Score added per signal unit beyond `critical`.
    pub saturation_step: f64,
}

impl Bands {
    pub const fn new(low: f64, high: f64, critical: f64, saturation_step: f64) -> Self {
        Self {
            low,
            high,
            critical,
            saturation_step,
        }
    }

    /// Map a non-negative signal onto the 0–100 curve.
    ///
    /// Non-finite or non-positive signals score 0, except `+inf` which saturates.
    pub fn score(&self, value: f64) -> f64 {
        if value == f64::INFINITY {
            return 100.0;
        }
        if !value.is_finite() || value <= 0.0 {
            return 0.0;
        }

        if value < self.low {
            return 40.0 * value / self.low;
        }
        if value < self.high {
            return 40.0 + 20.0 * fraction(value, self.low, self.high);
        }
        if value < self.critical {
            return 60.0 + 20.0 * fraction(value, self.high, self.critical);
        }

        let extra = (value - self.critical) * self.saturation_step.max(0.0);
        (80.0 + extra).min(100.0)
    }
}

fn fraction(value: f64, from: f64, to: f64) -> f64 {
    let span = to - from;
    if span <= 0.0 {
        return 1.0;
    }
    ((value - from) / span).clamp(0.0, 1.0)
}

/// Clamp a raw score into [0, 100]; NaN collapses to 0.
pub fn clamp_score(raw: f64) -> f64 {
    if raw.is_nan() { 0.0 } else { raw.clamp(0.0, 100.0) }
}
