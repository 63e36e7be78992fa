//! Per-item outcomes of batch runs.
//!
//! A batch never aborts on an item failure; each item lands in the report with
//! its own outcome.

use serde::Serialize;

use opsdeck_core::{FollowupId, RecommendationId, SnapshotId, StoreId};
use opsdeck_scoring::RecommendationReason;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScoreOutcome {
    #[serde(rename_all = "camelCase")]
    Scored { store_id: StoreId, snapshot_id: SnapshotId },
    #[serde(rename_all = "camelCase")]
    Failed { store_id: StoreId, error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecommendOutcome {
    #[serde(rename_all = "camelCase")]
    Created {
        store_id: StoreId,
        recommendation_id: RecommendationId,
        reason: RecommendationReason,
        priority: u8,
    },
    /// No rule matched the snapshot.
    #[serde(rename_all = "camelCase")]
    NoMatch { store_id: StoreId },
    /// The snapshot already has a recommendation.
    #[serde(rename_all = "camelCase")]
    Skipped { store_id: StoreId },
    #[serde(rename_all = "camelCase")]
    Failed { store_id: StoreId, error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncOutcome {
    #[serde(rename_all = "camelCase")]
    Synced {
        recommendation_id: RecommendationId,
        followup_id: FollowupId,
    },
    /// Claimed by a concurrent sync between listing and claiming.
    #[serde(rename_all = "camelCase")]
    AlreadySynced { recommendation_id: RecommendationId },
    #[serde(rename_all = "camelCase")]
    Failed {
        recommendation_id: RecommendationId,
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport<O> {
    pub outcomes: Vec<O>,
}

impl<O> Default for BatchReport<O> {
    fn default() -> Self {
        Self { outcomes: Vec::new() }
    }
}

impl<O> BatchReport<O> {
    pub fn push(&mut self, outcome: O) {
        self.outcomes.push(outcome);
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn count(&self, pred: impl Fn(&O) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(o)).count()
    }
}

impl BatchReport<ScoreOutcome> {
    pub fn scored(&self) -> usize {
        self.count(|o| matches!(o, ScoreOutcome::Scored { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, ScoreOutcome::Failed { .. }))
    }
}

impl BatchReport<RecommendOutcome> {
    pub fn created(&self) -> usize {
        self.count(|o| matches!(o, RecommendOutcome::Created { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, RecommendOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, RecommendOutcome::Failed { .. }))
    }
}

impl BatchReport<SyncOutcome> {
    pub fn synced(&self) -> usize {
        self.count(|o| matches!(o, SyncOutcome::Synced { .. }))
    }

    pub fn already_synced(&self) -> usize {
        self.count(|o| matches!(o, SyncOutcome::AlreadySynced { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, SyncOutcome::Failed { .. }))
    }
}
