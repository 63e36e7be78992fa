//! `opsdeck-scoring`: store scoring and recommendation domain.
//!
//! This crate turns upstream signals into bounded scores and prioritized
//! recommendations. It is deterministic given its inputs and a `now`
//! timestamp; storage lives in `opsdeck-infra`.
//!
//! Flow: [`signals::SignalCollector`] → [`calculator::calculate`] →
//! [`snapshot::ScoreSnapshot`] → [`rules::recommend`].

pub mod calculator;
pub mod followup;
pub mod recommendation;
pub mod rules;
pub mod signals;
pub mod snapshot;
pub mod store;

pub use calculator::{ScoringConfig, calculate, days_since_last_order};
pub use followup::{FollowupContext, FollowupEntry, FollowupStatus};
pub use recommendation::{Recommendation, RecommendationReason, RecommendedAction};
pub use rules::{RULES, RecommendationRule, first_match, recommend};
pub use signals::{
    DealRecord, DealStage, OrderRecord, SignalBundle, SignalCollector, SignalSource, SignalWindows,
    UpstreamError,
};
pub use snapshot::{ScoreFields, ScoreSnapshot, ScoreTag};
pub use store::{LifecycleStatus, Store, StoreDirectory, StoreScope};
