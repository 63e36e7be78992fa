//! Invoice non-payment: days overdue, boosted for large amounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::assessment::{RiskAssessment, RiskMessage, RiskSource, days_since};
use crate::config::RiskConfig;
use crate::level::RiskLevel;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceExposure {
    pub invoice_id: String,
    pub customer_name: String,
    pub amount: f64,
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub paid: bool,
    #[serde(default = "Utc::now")]
    pub as_of: DateTime<Utc>,
}

pub fn score_invoice_payment(input: &InvoiceExposure, config: &RiskConfig) -> RiskAssessment {
    let days_overdue = if input.paid {
        0
    } else {
        days_since(input.due_date, input.as_of)
    };

    let mut amount_boost = 0.0;
    if !input.paid {
        if input.amount > config.large_invoice_amount {
            amount_boost += config.amount_boost;
        }
        if input.amount > config.very_large_invoice_amount {
            amount_boost += config.amount_boost;
        }
    }

    let score = if input.paid {
        0.0
    } else {
        config.overdue_days.score(days_overdue as f64) + amount_boost
    };

    let source = RiskSource::InvoicePayment {
        days_overdue,
        amount: input.amount,
        amount_boost,
        paid: input.paid,
    };

    RiskAssessment::build(&input.invoice_id, score, source, |level| {
        let customer = &input.customer_name;
        let amount = input.amount;
        match level {
            RiskLevel::Critical => RiskMessage {
                headline: format!("Invoice for {customer} is seriously overdue"),
                details: format!("${amount:.2} outstanding, {days_overdue} days past due."),
                recommended_action: "Escalate to collections and pause new orders until settled.".to_string(),
            },
            RiskLevel::High => RiskMessage {
                headline: format!("Payment from {customer} at risk"),
                details: format!("${amount:.2} outstanding, {days_overdue} days past due."),
                recommended_action: "Call the customer and agree a payment date.".to_string(),
            },
            RiskLevel::Medium => RiskMessage {
                headline: format!("Invoice for {customer} is overdue"),
                details: format!("${amount:.2} outstanding, {days_overdue} days past due."),
                recommended_action: "Send a payment reminder.".to_string(),
            },
            RiskLevel::Low => RiskMessage {
                headline: format!("Invoice for {customer} is on track"),
                details: format!("${amount:.2}, {days_overdue} days past due."),
                recommended_action: "No action needed; include in the next statement run.".to_string(),
            },
        }
    })
}
