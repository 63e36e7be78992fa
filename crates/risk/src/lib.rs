//! `opsdeck-risk`
//!
//! **Responsibility:** point-in-time risk labels for operational subjects
//! (stores, invoices, inventory items, drivers, ambassadors).
//!
//! Every scorer is a pure function of a typed input and an explicit
//! [`RiskConfig`]:
//! - It must not perform IO.
//! - It must not read global state; defaults come from the caller's
//!   composition root via `RiskConfig::default()`.
//! - All scorers share the same banding curve and the same score→level table.

pub mod ambassador;
pub mod assessment;
pub mod config;
pub mod driver;
pub mod level;
pub mod payment;
pub mod scorer;
pub mod stock;
pub mod store_churn;
pub mod summary;

pub use ambassador::{AmbassadorActivity, score_ambassador_activity};
pub use assessment::{RiskAssessment, RiskSource, RiskType};
pub use config::RiskConfig;
pub use driver::{DriverWorkload, score_driver_workload};
pub use level::{Bands, RiskLevel};
pub use payment::{InvoiceExposure, score_invoice_payment};
pub use scorer::{RiskInput, RiskScorer, assess_all};
pub use stock::{InventoryLevel, score_inventory_stock};
pub use store_churn::{StoreActivity, score_store_churn};
pub use summary::{RiskSummary, compute_risk_summary};
