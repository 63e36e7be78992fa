//! Postgres-backed recommendation store and follow-up queue.
//!
//! ## Atomic sync claim
//!
//! `claim_and_enqueue` runs in one transaction:
//! 1. `UPDATE recommendations SET synced_to_followup = true … WHERE id = $1 AND
//!    synced_to_followup = false` (row lock; a concurrent claimer blocks, then
//!    sees zero rows)
//! 2. insert the `followup_queue` row (unique on `recommendation_id`)
//! 3. commit
//!
//! Zero rows from step 1, or a unique violation in step 2, means another sync
//! won; the transaction is rolled back and `AlreadySynced` returned.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::{debug, instrument};

use opsdeck_core::{BusinessId, FollowupId, RecommendationId, SnapshotId, StoreId, VerticalId};
use opsdeck_scoring::{
    FollowupContext, FollowupEntry, FollowupStatus, Recommendation, RecommendationReason, RecommendedAction,
};

use super::{ClaimOutcome, RecommendationStore};
use crate::error::{StoreError, is_unique_violation, map_sqlx_error};

const REC_COLUMNS: &str = r#"
    id, store_id, business_id, vertical_id, snapshot_id, priority, reason,
    recommended_action, notes, created_at, expires_at, synced_to_followup, followup_id
"#;

#[derive(Debug, Clone)]
pub struct PostgresRecommendationStore {
    pool: Arc<PgPool>,
}

impl PostgresRecommendationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }
}

fn decode_error(what: &str, value: &str) -> sqlx::Error {
    sqlx::Error::Decode(format!("unknown {what} `{value}`").into())
}

fn recommendation_from_row(row: &sqlx::postgres::PgRow) -> Result<Recommendation, sqlx::Error> {
    let reason: String = row.try_get("reason")?;
    let action: String = row.try_get("recommended_action")?;
    let priority: i16 = row.try_get("priority")?;

    Ok(Recommendation {
        id: RecommendationId::from_uuid(row.try_get("id")?),
        store_id: StoreId::from_uuid(row.try_get("store_id")?),
        business_id: BusinessId::from_uuid(row.try_get("business_id")?),
        vertical_id: row.try_get::<Option<uuid::Uuid>, _>("vertical_id")?.map(VerticalId::from_uuid),
        snapshot_id: SnapshotId::from_uuid(row.try_get("snapshot_id")?),
        priority: priority.clamp(1, 5) as u8,
        reason: RecommendationReason::parse(&reason).ok_or_else(|| decode_error("reason", &reason))?,
        recommended_action: RecommendedAction::parse(&action).ok_or_else(|| decode_error("action", &action))?,
        notes: row.try_get("notes")?,
        created_at: row.try_get("created_at")?,
        expires_at: row.try_get("expires_at")?,
        synced_to_followup: row.try_get("synced_to_followup")?,
        followup_id: row.try_get::<Option<uuid::Uuid>, _>("followup_id")?.map(FollowupId::from_uuid),
    })
}

fn followup_from_row(row: &sqlx::postgres::PgRow) -> Result<FollowupEntry, sqlx::Error> {
    let reason: String = row.try_get("reason")?;
    let action: String = row.try_get("recommended_action")?;
    let priority: i16 = row.try_get("priority")?;
    let context: serde_json::Value = row.try_get("context")?;
    let context: FollowupContext =
        serde_json::from_value(context).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

    Ok(FollowupEntry {
        id: FollowupId::from_uuid(row.try_get("id")?),
        store_id: StoreId::from_uuid(row.try_get("store_id")?),
        recommendation_id: RecommendationId::from_uuid(row.try_get("recommendation_id")?),
        reason: RecommendationReason::parse(&reason).ok_or_else(|| decode_error("reason", &reason))?,
        recommended_action: RecommendedAction::parse(&action).ok_or_else(|| decode_error("action", &action))?,
        priority: priority.clamp(1, 5) as u8,
        context,
        due_at: row.try_get("due_at")?,
        status: FollowupStatus::Pending,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl RecommendationStore for PostgresRecommendationStore {
    #[instrument(skip(self, rec), fields(store_id = %rec.store_id, snapshot_id = %rec.snapshot_id), err)]
    async fn insert_if_absent(&self, rec: Recommendation) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO recommendations (
                id, store_id, business_id, vertical_id, snapshot_id, priority, reason,
                recommended_action, notes, created_at, expires_at, synced_to_followup, followup_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, FALSE, NULL)
            ON CONFLICT (snapshot_id) DO NOTHING
            "#,
        )
        .bind(rec.id.as_uuid())
        .bind(rec.store_id.as_uuid())
        .bind(rec.business_id.as_uuid())
        .bind(rec.vertical_id.map(uuid::Uuid::from))
        .bind(rec.snapshot_id.as_uuid())
        .bind(i16::from(rec.priority))
        .bind(rec.reason.as_str())
        .bind(rec.recommended_action.as_str())
        .bind(&rec.notes)
        .bind(rec.created_at)
        .bind(rec.expires_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_recommendation", e))?;

        Ok(result.rows_affected() == 1)
    }

    async fn get(&self, id: RecommendationId) -> Result<Option<Recommendation>, StoreError> {
        let sql = format!("SELECT {REC_COLUMNS} FROM recommendations WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_recommendation", e))?;

        row.as_ref()
            .map(recommendation_from_row)
            .transpose()
            .map_err(|e| map_sqlx_error("decode_recommendation", e))
    }

    async fn list(&self, store_id: Option<StoreId>) -> Result<Vec<Recommendation>, StoreError> {
        let sql = format!(
            "SELECT {REC_COLUMNS} FROM recommendations \
             WHERE ($1::uuid IS NULL OR store_id = $1) \
             ORDER BY created_at DESC, id DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(store_id.map(uuid::Uuid::from))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_recommendations", e))?;

        rows.iter()
            .map(recommendation_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| map_sqlx_error("decode_recommendation", e))
    }

    async fn list_unsynced(
        &self,
        store_id: Option<StoreId>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Recommendation>, StoreError> {
        let sql = format!(
            "SELECT {REC_COLUMNS} FROM recommendations \
             WHERE synced_to_followup = FALSE AND expires_at > $2 \
             AND ($1::uuid IS NULL OR store_id = $1) \
             ORDER BY priority ASC, created_at ASC, id ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(store_id.map(uuid::Uuid::from))
            .bind(now)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_unsynced", e))?;

        rows.iter()
            .map(recommendation_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| map_sqlx_error("decode_recommendation", e))
    }

    #[instrument(
        skip(self, entry),
        fields(recommendation_id = %entry.recommendation_id, followup_id = %entry.id),
        err
    )]
    async fn claim_and_enqueue(&self, entry: FollowupEntry) -> Result<ClaimOutcome, StoreError> {
        let context = serde_json::to_value(&entry.context)
            .map_err(|e| StoreError::Storage(format!("failed to serialize follow-up context: {e}")))?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let claimed = sqlx::query(
            r#"
            UPDATE recommendations
            SET synced_to_followup = TRUE, followup_id = $2
            WHERE id = $1 AND synced_to_followup = FALSE
            "#,
        )
        .bind(entry.recommendation_id.as_uuid())
        .bind(entry.id.as_uuid())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("claim_recommendation", e))?;

        if claimed.rows_affected() == 0 {
            let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM recommendations WHERE id = $1)")
                .bind(entry.recommendation_id.as_uuid())
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("claim_recommendation", e))?;
            tx.rollback().await.map_err(|e| map_sqlx_error("rollback", e))?;

            return if exists {
                Ok(ClaimOutcome::AlreadySynced)
            } else {
                Err(StoreError::NotFound(format!("recommendation {}", entry.recommendation_id)))
            };
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO followup_queue (
                id, store_id, recommendation_id, reason, recommended_action,
                priority, context, due_at, status, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(entry.id.as_uuid())
        .bind(entry.store_id.as_uuid())
        .bind(entry.recommendation_id.as_uuid())
        .bind(entry.reason.as_str())
        .bind(entry.recommended_action.as_str())
        .bind(i16::from(entry.priority))
        .bind(&context)
        .bind(entry.due_at)
        .bind(entry.status.as_str())
        .bind(entry.created_at)
        .execute(&mut *tx)
        .await;

        match inserted {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                tx.rollback().await.map_err(|e| map_sqlx_error("rollback", e))?;
                debug!("follow-up already queued by a concurrent sync");
                return Ok(ClaimOutcome::AlreadySynced);
            }
            Err(e) => {
                tx.rollback().await.map_err(|e| map_sqlx_error("rollback", e))?;
                return Err(map_sqlx_error("enqueue_followup", e));
            }
        }

        tx.commit().await.map_err(|e| map_sqlx_error("commit", e))?;
        Ok(ClaimOutcome::Enqueued(entry.id))
    }

    async fn list_followups(&self, store_id: Option<StoreId>) -> Result<Vec<FollowupEntry>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, store_id, recommendation_id, reason, recommended_action,
                   priority, context, due_at, status, created_at
            FROM followup_queue
            WHERE ($1::uuid IS NULL OR store_id = $1)
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(store_id.map(uuid::Uuid::from))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_followups", e))?;

        rows.iter()
            .map(followup_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| map_sqlx_error("decode_followup", e))
    }
}
