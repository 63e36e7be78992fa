//! Driver reliability / overwork: route load plus consecutive cancellations.

use serde::{Deserialize, Serialize};

use crate::assessment::{RiskAssessment, RiskMessage, RiskSource};
use crate::config::RiskConfig;
use crate::level::RiskLevel;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverWorkload {
    pub driver_id: String,
    pub name: String,
    pub routes_last_7d: u32,
    #[serde(default)]
    pub consecutive_cancellations: u32,
}

pub fn score_driver_workload(input: &DriverWorkload, config: &RiskConfig) -> RiskAssessment {
    let load = config.overwork_bands().score(input.routes_last_7d as f64);
    let penalty = (input.consecutive_cancellations as f64 * config.cancellation_penalty)
        .min(config.max_cancellation_penalty);

    let source = RiskSource::DriverWorkload {
        routes_last_7d: input.routes_last_7d,
        consecutive_cancellations: input.consecutive_cancellations,
        cancellation_penalty: penalty,
    };

    RiskAssessment::build(&input.driver_id, load + penalty, source, |level| {
        let name = &input.name;
        let routes = input.routes_last_7d;
        let cancels = input.consecutive_cancellations;
        match level {
            RiskLevel::Critical => RiskMessage {
                headline: format!("{name} is overloaded"),
                details: format!("{routes} routes in 7 days, {cancels} cancellations in a row."),
                recommended_action: "Reassign upcoming routes and give the driver a rest day now.".to_string(),
            },
            RiskLevel::High => RiskMessage {
                headline: format!("{name} is close to overwork"),
                details: format!("{routes} routes in 7 days, {cancels} cancellations in a row."),
                recommended_action: "Rebalance next week's schedule.".to_string(),
            },
            RiskLevel::Medium => RiskMessage {
                headline: format!("{name} has a heavy schedule"),
                details: format!("{routes} routes in 7 days."),
                recommended_action: "Monitor route completion this week.".to_string(),
            },
            RiskLevel::Low => RiskMessage {
                headline: format!("{name} workload is normal"),
                details: format!("{routes} routes in 7 days."),
                recommended_action: "No action needed.".to_string(),
            },
        }
    })
}
