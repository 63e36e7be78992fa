use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Semaphore;
use tracing::{info, instrument, warn};

use opsdeck_core::{SnapshotId, StoreId};
use opsdeck_scoring::{ScoreSnapshot, SignalCollector, Store, StoreScope, calculate};

use super::report::{BatchReport, ScoreOutcome};
use super::{EngineError, ScoringEngine};

impl ScoringEngine {
    /// Compute and persist today's snapshot for one store.
    ///
    /// Re-running on the same UTC date replaces the snapshot (same id).
    #[instrument(skip(self), fields(store_id = %store_id), err)]
    pub async fn score_store(&self, store_id: StoreId, now: DateTime<Utc>) -> Result<ScoreSnapshot, EngineError> {
        let store = self
            .upstream
            .get_store(store_id)
            .await?
            .ok_or(EngineError::NotFound(store_id))?;

        self.score_loaded(&store, now).await
    }

    async fn score_loaded(&self, store: &Store, now: DateTime<Utc>) -> Result<ScoreSnapshot, EngineError> {
        let bundle = SignalCollector::new(&*self.upstream)
            .with_windows(self.windows)
            .collect(store, now)
            .await?;

        let fields = calculate(&bundle, &self.scoring, now);

        let snapshot = ScoreSnapshot {
            id: SnapshotId::new(),
            store_id: store.id,
            business_id: store.business_id,
            vertical_id: store.vertical_id,
            snapshot_date: now.date_naive(),
            computed_at: now,
            fields,
        };

        Ok(self.snapshots.upsert(snapshot).await?)
    }

    /// Score every scoreable store in `scope` with at most `concurrency`
    /// stores in flight. One store failing never stops the others.
    ///
    /// Outcomes are reported in store listing order.
    #[instrument(skip(self), fields(concurrency = self.concurrency), err)]
    pub async fn score_all(&self, scope: StoreScope, now: DateTime<Utc>) -> Result<BatchReport<ScoreOutcome>, EngineError> {
        let stores = self.upstream.list_scoreable(scope).await?;
        let permits = Arc::new(Semaphore::new(self.concurrency));

        let mut tasks = Vec::with_capacity(stores.len());
        for store in stores {
            let engine = self.clone();
            let permits = permits.clone();
            let store_id = store.id;
            let handle = tokio::spawn(async move {
                let _permit = match permits.acquire_owned().await {
                    Ok(p) => p,
                    Err(_) => {
                        return ScoreOutcome::Failed {
                            store_id: store.id,
                            error: "worker pool closed".to_string(),
                        };
                    }
                };
                match engine.score_loaded(&store, now).await {
                    Ok(snapshot) => ScoreOutcome::Scored {
                        store_id: store.id,
                        snapshot_id: snapshot.id,
                    },
                    Err(e) => {
                        warn!(store_id = %store.id, error = %e, "store scoring failed");
                        ScoreOutcome::Failed {
                            store_id: store.id,
                            error: e.to_string(),
                        }
                    }
                }
            });
            tasks.push((store_id, handle));
        }

        let mut report = BatchReport::default();
        for (store_id, handle) in tasks {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(join_err) => {
                    warn!(store_id = %store_id, error = %join_err, "scoring task aborted");
                    ScoreOutcome::Failed {
                        store_id,
                        error: format!("scoring task aborted: {join_err}"),
                    }
                }
            };
            report.push(outcome);
        }

        info!(
            total = report.len(),
            scored = report.scored(),
            failed = report.failed(),
            "score_all finished"
        );
        Ok(report)
    }
}
