use chrono::{DateTime, NaiveDate, Utc};
use tracing::{info, instrument, warn};

use opsdeck_scoring::{StoreScope, recommend};

use super::report::{BatchReport, RecommendOutcome};
use super::{EngineError, ScoringEngine};

impl ScoringEngine {
    /// Evaluate the rule table over the snapshots of `date` (default: today).
    ///
    /// Each snapshot yields at most one recommendation; re-running for the
    /// same date reports already-recommended snapshots as skipped.
    #[instrument(skip(self), err)]
    pub async fn generate_recommendations(
        &self,
        date: Option<NaiveDate>,
        scope: StoreScope,
        now: DateTime<Utc>,
    ) -> Result<BatchReport<RecommendOutcome>, EngineError> {
        let date = date.unwrap_or_else(|| now.date_naive());
        let snapshots = self.snapshots.get_snapshots(date, scope).await?;

        let mut report = BatchReport::default();
        for snapshot in &snapshots {
            let store_id = snapshot.store_id;
            let Some(rec) = recommend(snapshot, now) else {
                report.push(RecommendOutcome::NoMatch { store_id });
                continue;
            };

            let (recommendation_id, reason, priority) = (rec.id, rec.reason, rec.priority);
            let outcome = match self.recommendations.insert_if_absent(rec).await {
                Ok(true) => RecommendOutcome::Created {
                    store_id,
                    recommendation_id,
                    reason,
                    priority,
                },
                Ok(false) => RecommendOutcome::Skipped { store_id },
                Err(e) => {
                    warn!(store_id = %store_id, error = %e, "failed to persist recommendation");
                    RecommendOutcome::Failed {
                        store_id,
                        error: e.to_string(),
                    }
                }
            };
            report.push(outcome);
        }

        info!(
            %date,
            snapshots = snapshots.len(),
            created = report.created(),
            skipped = report.skipped(),
            failed = report.failed(),
            "recommendations generated"
        );
        Ok(report)
    }
}
