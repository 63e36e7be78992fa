//! Infrastructure layer: configuration, upstream adapters, persistence, and the
//! engine runners that tie them together.

pub mod config;
pub mod engine;
pub mod error;
pub mod recommendations;
pub mod snapshots;
pub mod sources;

#[cfg(test)]
mod integration_tests;

pub use config::{ConfigError, EngineConfig};
pub use engine::{EngineError, ScoringEngine};
pub use error::StoreError;
