//! Inventory low stock: how much of the reorder point has been consumed.

use serde::{Deserialize, Serialize};

use crate::assessment::{RiskAssessment, RiskMessage, RiskSource};
use crate::config::RiskConfig;
use crate::level::RiskLevel;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryLevel {
    pub item_id: String,
    pub name: String,
    pub quantity: i64,
    pub reorder_point: i64,
}

pub fn score_inventory_stock(input: &InventoryLevel, config: &RiskConfig) -> RiskAssessment {
    let denominator = if input.reorder_point > 0 {
        input.reorder_point as f64
    } else {
        config.low_stock_threshold.max(1.0)
    };

    let (score, depletion_pct) = if input.quantity <= 0 {
        (100.0, 100.0)
    } else {
        let pct = ((1.0 - input.quantity as f64 / denominator) * 100.0).max(0.0);
        (config.depletion_pct.score(pct), pct)
    };

    let source = RiskSource::InventoryStock {
        quantity: input.quantity,
        reorder_point: input.reorder_point,
        effective_reorder_point: denominator,
        depletion_pct,
    };

    let out_of_stock = input.quantity <= 0;
    RiskAssessment::build(&input.item_id, score, source, |level| {
        let name = &input.name;
        let qty = input.quantity;
        match level {
            RiskLevel::Critical if out_of_stock => RiskMessage {
                headline: format!("{name} is OUT OF STOCK"),
                details: "Quantity on hand is zero; orders for this item cannot be fulfilled.".to_string(),
                recommended_action: "Place an emergency purchase order now.".to_string(),
            },
            RiskLevel::Critical => RiskMessage {
                headline: format!("{name} is almost out of stock"),
                details: format!("Only {qty} left against a reorder point of {denominator:.0}."),
                recommended_action: "Place a purchase order today.".to_string(),
            },
            RiskLevel::High => RiskMessage {
                headline: format!("{name} is running low"),
                details: format!("{qty} on hand, {depletion_pct:.0}% below the reorder point."),
                recommended_action: "Raise a purchase order this week.".to_string(),
            },
            RiskLevel::Medium => RiskMessage {
                headline: format!("{name} is below its reorder point"),
                details: format!("{qty} on hand against a reorder point of {denominator:.0}."),
                recommended_action: "Add to the next scheduled purchase order.".to_string(),
            },
            RiskLevel::Low => RiskMessage {
                headline: format!("{name} stock is healthy"),
                details: format!("{qty} on hand."),
                recommended_action: "No action needed.".to_string(),
            },
        }
    })
}
