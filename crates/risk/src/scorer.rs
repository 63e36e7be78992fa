use serde::{Deserialize, Serialize};

use crate::ambassador::{AmbassadorActivity, score_ambassador_activity};
use crate::assessment::{RiskAssessment, RiskType};
use crate::config::RiskConfig;
use crate::driver::{DriverWorkload, score_driver_workload};
use crate::payment::{InvoiceExposure, score_invoice_payment};
use crate::stock::{InventoryLevel, score_inventory_stock};
use crate::store_churn::{StoreActivity, score_store_churn};

/// A typed input that knows which scorer applies to it.
pub trait RiskScorer {
    fn risk_type(&self) -> RiskType;

    fn assess(&self, config: &RiskConfig) -> RiskAssessment;
}

impl RiskScorer for StoreActivity {
    fn risk_type(&self) -> RiskType {
        RiskType::StoreChurn
    }

    fn assess(&self, config: &RiskConfig) -> RiskAssessment {
        score_store_churn(self, config)
    }
}

impl RiskScorer for InvoiceExposure {
    fn risk_type(&self) -> RiskType {
        RiskType::InvoicePayment
    }

    fn assess(&self, config: &RiskConfig) -> RiskAssessment {
        score_invoice_payment(self, config)
    }
}

impl RiskScorer for InventoryLevel {
    fn risk_type(&self) -> RiskType {
        RiskType::InventoryStock
    }

    fn assess(&self, config: &RiskConfig) -> RiskAssessment {
        score_inventory_stock(self, config)
    }
}

impl RiskScorer for DriverWorkload {
    fn risk_type(&self) -> RiskType {
        RiskType::DriverWorkload
    }

    fn assess(&self, config: &RiskConfig) -> RiskAssessment {
        score_driver_workload(self, config)
    }
}

impl RiskScorer for AmbassadorActivity {
    fn risk_type(&self) -> RiskType {
        RiskType::AmbassadorActivity
    }

    fn assess(&self, config: &RiskConfig) -> RiskAssessment {
        score_ambassador_activity(self, config)
    }
}

/// Heterogeneous scorer input, tagged by risk type on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "risk_type", rename_all = "snake_case")]
pub enum RiskInput {
    StoreChurn(StoreActivity),
    InvoicePayment(InvoiceExposure),
    InventoryStock(InventoryLevel),
    DriverWorkload(DriverWorkload),
    AmbassadorActivity(AmbassadorActivity),
}

impl RiskScorer for RiskInput {
    fn risk_type(&self) -> RiskType {
        match self {
            RiskInput::StoreChurn(i) => i.risk_type(),
            RiskInput::InvoicePayment(i) => i.risk_type(),
            RiskInput::InventoryStock(i) => i.risk_type(),
            RiskInput::DriverWorkload(i) => i.risk_type(),
            RiskInput::AmbassadorActivity(i) => i.risk_type(),
        }
    }

    fn assess(&self, config: &RiskConfig) -> RiskAssessment {
        match self {
            RiskInput::StoreChurn(i) => i.assess(config),
            RiskInput::InvoicePayment(i) => i.assess(config),
            RiskInput::InventoryStock(i) => i.assess(config),
            RiskInput::DriverWorkload(i) => i.assess(config),
            RiskInput::AmbassadorActivity(i) => i.assess(config),
        }
    }
}

/// Assess every input with the same config, preserving input order.
pub fn assess_all<S: RiskScorer>(inputs: &[S], config: &RiskConfig) -> Vec<RiskAssessment> {
    inputs.iter().map(|i| i.assess(config)).collect()
}
