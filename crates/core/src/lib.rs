//! `opsdeck-core`: shared building blocks for the scoring engine.
//!
//! This crate contains **pure** primitives (no infrastructure concerns).

pub mod error;
pub mod id;

pub use error::DomainError;
pub use id::{BusinessId, FollowupId, RecommendationId, SnapshotId, StoreId, VerticalId};
