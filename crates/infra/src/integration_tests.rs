//! Integration tests for the full in-memory pipeline.
//!
//! Tests: upstream signals → score_all → snapshots → generate_recommendations
//! → sync_to_followup → follow-up queue
//!
//! Verifies:
//! - Re-scoring on the same date keeps one snapshot per store
//! - One recommendation per snapshot, first matching rule wins
//! - Sync is exactly-once, including under concurrent syncs
//! - A failing store never aborts the batch

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{DateTime, Duration, Utc};

    use opsdeck_core::{BusinessId, StoreId};
    use opsdeck_scoring::{
        DealRecord, DealStage, LifecycleStatus, RecommendationReason, RecommendedAction, ScoreTag, Store,
        StoreScope,
    };

    use crate::engine::{EngineError, RecommendOutcome, ScoringEngine};
    use crate::recommendations::{InMemoryRecommendationStore, RecommendationStore};
    use crate::snapshots::{InMemorySnapshotStore, SnapshotStore};
    use crate::sources::InMemorySignalSource;

    struct Fixture {
        engine: ScoringEngine,
        source: Arc<InMemorySignalSource>,
        snapshots: Arc<InMemorySnapshotStore>,
        recommendations: Arc<InMemoryRecommendationStore>,
        business: BusinessId,
        hot: StoreId,
        churning: StoreId,
        quiet: StoreId,
        now: DateTime<Utc>,
    }

    fn store(business_id: BusinessId, name: &str, status: LifecycleStatus) -> Store {
        Store {
            id: StoreId::new(),
            business_id,
            vertical_id: None,
            name: name.to_string(),
            status,
            last_order_at: None,
            last_visit_at: None,
        }
    }

    /// Three stores: one due to reorder, one lapsing, one with no activity.
    fn setup() -> Fixture {
        // Midday keeps `now ± minutes` on the same snapshot date.
        let now = Utc::now().date_naive().and_hms_opt(12, 0, 0).unwrap().and_utc();
        let business = BusinessId::new();
        let recommendations = Arc::new(InMemoryRecommendationStore::new());
        let source = Arc::new(InMemorySignalSource::new().with_followup_queue(recommendations.clone()));

        let hot = store(business, "Harbor Grocery", LifecycleStatus::Active);
        for days in [9, 15, 25] {
            source.add_order(hot.id, 1_000.0, now - Duration::days(days));
        }
        source.add_sentiment(hot.id, 40.0, now - Duration::days(1));
        for _ in 0..2 {
            source.add_deal(DealRecord {
                store_id: hot.id,
                stage: DealStage::Won,
                updated_at: now - Duration::days(10),
            });
        }

        let churning = store(business, "Elm Street Liquor", LifecycleStatus::Prospect);
        source.add_order(churning.id, 200.0, now - Duration::days(75));
        source.add_sentiment(churning.id, -50.0, now - Duration::days(2));

        let quiet = store(business, "Quiet Corner", LifecycleStatus::Active);

        let (hot_id, churning_id, quiet_id) = (hot.id, churning.id, quiet.id);
        source.add_store(hot);
        source.add_store(churning);
        source.add_store(quiet);
        source.add_store(store(business, "Closed Down", LifecycleStatus::Churned));

        let snapshots = Arc::new(InMemorySnapshotStore::new());
        let engine = ScoringEngine::new(source.clone(), snapshots.clone(), recommendations.clone()).with_concurrency(2);

        Fixture {
            engine,
            source,
            snapshots,
            recommendations,
            business,
            hot: hot_id,
            churning: churning_id,
            quiet: quiet_id,
            now,
        }
    }

    fn reason_for(outcomes: &[RecommendOutcome], store: StoreId) -> Option<(RecommendationReason, u8)> {
        outcomes.iter().find_map(|o| match o {
            RecommendOutcome::Created {
                store_id,
                reason,
                priority,
                ..
            } if *store_id == store => Some((*reason, *priority)),
            _ => None,
        })
    }

    #[tokio::test]
    async fn pipeline_scores_recommends_and_syncs() {
        let f = setup();

        let scored = f.engine.score_all(StoreScope::all(), f.now).await.unwrap();
        assert_eq!(scored.len(), 3, "churned store is not scoreable");
        assert_eq!(scored.scored(), 3);
        assert_eq!(f.snapshots.len(), 3);

        let hot = f.snapshots.get(f.hot, f.now.date_naive()).await.unwrap().unwrap();
        assert!(hot.fields.has_tag(ScoreTag::Hot));
        assert!(hot.fields.order_prob_7d >= 60.0);

        let churning = f.snapshots.get(f.churning, f.now.date_naive()).await.unwrap().unwrap();
        assert_eq!(churning.fields.days_since_last_order, 75);
        assert!(churning.fields.has_tag(ScoreTag::ChurnRisk));
        assert!(churning.fields.has_tag(ScoreTag::NegativeSentiment));

        let generated = f
            .engine
            .generate_recommendations(None, StoreScope::all(), f.now)
            .await
            .unwrap();
        assert_eq!(generated.created(), 3);
        assert_eq!(
            reason_for(&generated.outcomes, f.hot),
            Some((RecommendationReason::HotStoreRestock, 1))
        );
        assert_eq!(
            reason_for(&generated.outcomes, f.churning),
            Some((RecommendationReason::ChurnRisk, 1))
        );
        assert_eq!(
            reason_for(&generated.outcomes, f.quiet),
            Some((RecommendationReason::ModerateOpportunity, 3))
        );

        let synced = f.engine.sync_to_followup(None, f.now).await.unwrap();
        assert_eq!(synced.synced(), 3);

        let queue = f.recommendations.list_followups(None).await.unwrap();
        assert_eq!(queue.len(), 3);
        let priorities: Vec<u8> = queue.iter().map(|e| e.priority).collect();
        assert_eq!(priorities, vec![1, 1, 3], "most urgent first");
        for entry in &queue {
            let expected = if entry.priority <= 2 { Duration::hours(24) } else { Duration::hours(48) };
            assert_eq!(entry.due_at, f.now + expected);
        }
        let churn_entry = queue.iter().find(|e| e.store_id == f.churning).unwrap();
        assert_eq!(churn_entry.recommended_action, RecommendedAction::ManualCall);

        let again = f.engine.sync_to_followup(None, f.now).await.unwrap();
        assert!(again.is_empty());
        assert_eq!(again.synced(), 0);
    }

    #[tokio::test]
    async fn rescoring_same_day_replaces_snapshot() {
        let f = setup();

        let first = f.engine.score_store(f.quiet, f.now).await.unwrap();
        f.source.add_order(f.quiet, 2_500.0, f.now - Duration::days(1));
        let second = f
            .engine
            .score_store(f.quiet, f.now + Duration::minutes(5))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(f.snapshots.len(), 1);
        let stored = f.snapshots.get(f.quiet, f.now.date_naive()).await.unwrap().unwrap();
        assert_eq!(stored.fields.revenue_30d, 2_500.0);
        assert_eq!(stored.computed_at, f.now + Duration::minutes(5));
    }

    #[tokio::test]
    async fn score_store_unknown_is_not_found() {
        let f = setup();
        let missing = StoreId::new();
        let err = f.engine.score_store(missing, f.now).await.unwrap_err();
        assert_eq!(err, EngineError::NotFound(missing));
        assert!(f.snapshots.is_empty());
    }

    #[tokio::test]
    async fn regenerating_skips_recommended_snapshots() {
        let f = setup();
        f.engine.score_all(StoreScope::all(), f.now).await.unwrap();

        let first = f.engine.generate_recommendations(None, StoreScope::all(), f.now).await.unwrap();
        let second = f.engine.generate_recommendations(None, StoreScope::all(), f.now).await.unwrap();

        assert_eq!(first.created(), 3);
        assert_eq!(second.created(), 0);
        assert_eq!(second.skipped(), 3);
        assert_eq!(f.recommendations.list(None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn score_all_isolates_failing_store() {
        let f = setup();
        f.source.mark_unavailable(f.churning);

        let report = f.engine.score_all(StoreScope::all(), f.now).await.unwrap();

        assert_eq!(report.scored(), 2);
        assert_eq!(report.failed(), 1);
        assert!(f.snapshots.get(f.churning, f.now.date_naive()).await.unwrap().is_none());
        assert!(f.snapshots.get(f.hot, f.now.date_naive()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn score_all_respects_scope() {
        let f = setup();
        let other = store(BusinessId::new(), "Elsewhere", LifecycleStatus::Active);
        f.source.add_store(other.clone());

        let scope = StoreScope {
            business_id: Some(f.business),
            vertical_id: None,
        };
        let report = f.engine.score_all(scope, f.now).await.unwrap();
        assert_eq!(report.scored(), 3);
        assert!(f.snapshots.get(other.id, f.now.date_naive()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn sync_single_store_leaves_others_pending() {
        let f = setup();
        f.engine.score_all(StoreScope::all(), f.now).await.unwrap();
        f.engine.generate_recommendations(None, StoreScope::all(), f.now).await.unwrap();

        let report = f.engine.sync_to_followup(Some(f.hot), f.now).await.unwrap();
        assert_eq!(report.synced(), 1);
        assert_eq!(f.recommendations.list_unsynced(None, f.now).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn synced_followups_raise_follow_up_intensity() {
        let f = setup();
        let before = f.engine.score_store(f.quiet, f.now).await.unwrap();
        assert_eq!(before.fields.follow_up_intensity, 0.0);

        f.engine.generate_recommendations(None, StoreScope::all(), f.now).await.unwrap();
        f.engine.sync_to_followup(Some(f.quiet), f.now).await.unwrap();
        f.source.add_followup(f.quiet, f.now - Duration::days(3));

        let after = f
            .engine
            .score_store(f.quiet, f.now + Duration::minutes(5))
            .await
            .unwrap();
        assert_eq!(after.fields.follow_up_intensity, 20.0, "one enqueued plus one seeded");
    }

    #[tokio::test]
    async fn expired_recommendations_are_not_synced() {
        let f = setup();
        f.engine.score_all(StoreScope::all(), f.now).await.unwrap();
        f.engine.generate_recommendations(None, StoreScope::all(), f.now).await.unwrap();

        for days in [8, 30, 365] {
            let report = f.engine.sync_to_followup(None, f.now + Duration::days(days)).await.unwrap();
            assert!(report.is_empty(), "expired recommendations reported after {days} days");
        }
        let report = f
            .engine
            .sync_to_followup(Some(f.hot), f.now + Duration::days(8))
            .await
            .unwrap();
        assert!(report.is_empty());

        assert!(f.recommendations.list_followups(None).await.unwrap().is_empty());
        assert_eq!(f.recommendations.list(None).await.unwrap().len(), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_syncs_enqueue_each_recommendation_once() {
        let f = setup();
        f.engine.score_all(StoreScope::all(), f.now).await.unwrap();
        f.engine.generate_recommendations(None, StoreScope::all(), f.now).await.unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let engine = f.engine.clone();
                let now = f.now;
                tokio::spawn(async move { engine.sync_to_followup(None, now).await })
            })
            .collect();

        let mut synced = 0;
        for h in handles {
            synced += h.await.unwrap().unwrap().synced();
        }

        assert_eq!(synced, 3);
        assert_eq!(f.recommendations.list_followups(None).await.unwrap().len(), 3);
        for rec in f.recommendations.list(None).await.unwrap() {
            assert!(rec.synced_to_followup);
            assert!(rec.followup_id.is_some());
        }
    }
}
