//! Engine runners: score one store, score the fleet, generate recommendations,
//! sync recommendations to the follow-up queue.
//!
//! The engine owns no data; it wires an upstream source, the snapshot store and
//! the recommendation store together. Every runner takes `now` explicitly.

pub mod followup_sync;
pub mod generate;
pub mod report;
pub mod score;

use std::sync::Arc;

use thiserror::Error;

use opsdeck_core::StoreId;
use opsdeck_scoring::{ScoringConfig, SignalSource, SignalWindows, StoreDirectory, UpstreamError};

use crate::config::DEFAULT_SCORE_ALL_CONCURRENCY;
use crate::error::StoreError;
use crate::recommendations::RecommendationStore;
use crate::snapshots::SnapshotStore;

pub use report::{BatchReport, RecommendOutcome, ScoreOutcome, SyncOutcome};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("store not found: {0}")]
    NotFound(StoreId),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("persistence failure: {0}")]
    Persistence(#[from] StoreError),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

impl EngineError {
    /// Stable machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::NotFound(_) => "not_found",
            EngineError::Validation(_) => "validation_error",
            EngineError::Persistence(_) => "persistence_error",
            EngineError::Upstream(_) => "upstream_error",
        }
    }
}

/// Upstream reads needed by the engine: store records and signals.
pub trait UpstreamSource: SignalSource + StoreDirectory {}

impl<T> UpstreamSource for T where T: SignalSource + StoreDirectory + ?Sized {}

/// Scoring engine wiring. Cheap to clone.
#[derive(Clone)]
pub struct ScoringEngine {
    upstream: Arc<dyn UpstreamSource>,
    snapshots: Arc<dyn SnapshotStore>,
    recommendations: Arc<dyn RecommendationStore>,
    scoring: ScoringConfig,
    windows: SignalWindows,
    concurrency: usize,
}

impl ScoringEngine {
    pub fn new(
        upstream: Arc<dyn UpstreamSource>,
        snapshots: Arc<dyn SnapshotStore>,
        recommendations: Arc<dyn RecommendationStore>,
    ) -> Self {
        Self {
            upstream,
            snapshots,
            recommendations,
            scoring: ScoringConfig::default(),
            windows: SignalWindows::default(),
            concurrency: DEFAULT_SCORE_ALL_CONCURRENCY,
        }
    }

    pub fn with_scoring_config(mut self, scoring: ScoringConfig) -> Self {
        self.scoring = scoring;
        self
    }

    pub fn with_windows(mut self, windows: SignalWindows) -> Self {
        self.windows = windows;
        self
    }

    /// Maximum stores scored at once by `score_all` (at least 1).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn snapshots(&self) -> &Arc<dyn SnapshotStore> {
        &self.snapshots
    }

    pub fn recommendations(&self) -> &Arc<dyn RecommendationStore> {
        &self.recommendations
    }
}

impl std::fmt::Debug for ScoringEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoringEngine")
            .field("scoring", &self.scoring)
            .field("windows", &self.windows)
            .field("concurrency", &self.concurrency)
            .finish_non_exhaustive()
    }
}
