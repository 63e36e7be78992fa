use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};

use opsdeck_core::StoreId;
use opsdeck_scoring::FollowupEntry;

use super::report::{BatchReport, SyncOutcome};
use super::{EngineError, ScoringEngine};
use crate::recommendations::ClaimOutcome;

impl ScoringEngine {
    /// Push unsynced recommendations (one store, or all when `store_id` is
    /// `None`) into the follow-up queue, most urgent first.
    ///
    /// Each recommendation is claimed atomically, so concurrent syncs never
    /// enqueue it twice. Recommendations past `expires_at` are not listed,
    /// so they are never synced or reported.
    #[instrument(skip(self), err)]
    pub async fn sync_to_followup(
        &self,
        store_id: Option<StoreId>,
        now: DateTime<Utc>,
    ) -> Result<BatchReport<SyncOutcome>, EngineError> {
        let pending = self.recommendations.list_unsynced(store_id, now).await?;

        let mut report = BatchReport::default();
        for rec in &pending {
            let recommendation_id = rec.id;
            let entry = FollowupEntry::for_recommendation(rec, now);
            let outcome = match self.recommendations.claim_and_enqueue(entry).await {
                Ok(ClaimOutcome::Enqueued(followup_id)) => SyncOutcome::Synced {
                    recommendation_id,
                    followup_id,
                },
                Ok(ClaimOutcome::AlreadySynced) => SyncOutcome::AlreadySynced { recommendation_id },
                Err(e) => {
                    warn!(%recommendation_id, error = %e, "failed to enqueue follow-up");
                    SyncOutcome::Failed {
                        recommendation_id,
                        error: e.to_string(),
                    }
                }
            };
            report.push(outcome);
        }

        info!(
            pending = pending.len(),
            synced = report.synced(),
            already_synced = report.already_synced(),
            failed = report.failed(),
            "follow-up sync finished"
        );
        Ok(report)
    }
}
