//! Postgres-backed snapshot store.
//!
//! `upsert` is a single `INSERT … ON CONFLICT (store_id, snapshot_date) DO
//! UPDATE` statement, so a snapshot is written completely or not at all.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Row};
use tracing::{Span, instrument};

use opsdeck_core::{BusinessId, SnapshotId, StoreId, VerticalId};
use opsdeck_scoring::{ScoreFields, ScoreSnapshot, ScoreTag, StoreScope};

use super::SnapshotStore;
use crate::error::{StoreError, map_sqlx_error};

const SELECT_COLUMNS: &str = r#"
    id, store_id, business_id, vertical_id, snapshot_date, computed_at,
    heat_score, churn_risk, order_prob_7d,
    avg_order_value, revenue_30d, revenue_90d, order_count_30d, order_count_90d,
    last_order_at, days_since_last_order, predicted_next_order_at,
    restock_window_start, restock_window_end,
    communication_score, sentiment_score, deal_activity_score, follow_up_intensity,
    tags
"#;

#[derive(Debug, Clone)]
pub struct PostgresSnapshotStore {
    pool: Arc<PgPool>,
}

impl PostgresSnapshotStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }
}

fn snapshot_from_row(row: &sqlx::postgres::PgRow) -> Result<ScoreSnapshot, sqlx::Error> {
    let tags: Vec<String> = row.try_get("tags")?;
    let order_count_30d: i32 = row.try_get("order_count_30d")?;
    let order_count_90d: i32 = row.try_get("order_count_90d")?;

    Ok(ScoreSnapshot {
        id: SnapshotId::from_uuid(row.try_get("id")?),
        store_id: StoreId::from_uuid(row.try_get("store_id")?),
        business_id: BusinessId::from_uuid(row.try_get("business_id")?),
        vertical_id: row.try_get::<Option<uuid::Uuid>, _>("vertical_id")?.map(VerticalId::from_uuid),
        snapshot_date: row.try_get("snapshot_date")?,
        computed_at: row.try_get("computed_at")?,
        fields: ScoreFields {
            heat_score: row.try_get("heat_score")?,
            churn_risk: row.try_get("churn_risk")?,
            order_prob_7d: row.try_get("order_prob_7d")?,
            avg_order_value: row.try_get("avg_order_value")?,
            revenue_30d: row.try_get("revenue_30d")?,
            revenue_90d: row.try_get("revenue_90d")?,
            order_count_30d: order_count_30d.max(0) as u32,
            order_count_90d: order_count_90d.max(0) as u32,
            last_order_at: row.try_get::<Option<DateTime<Utc>>, _>("last_order_at")?,
            days_since_last_order: row.try_get("days_since_last_order")?,
            predicted_next_order_at: row.try_get("predicted_next_order_at")?,
            restock_window_start: row.try_get("restock_window_start")?,
            restock_window_end: row.try_get("restock_window_end")?,
            communication_score: row.try_get("communication_score")?,
            sentiment_score: row.try_get("sentiment_score")?,
            deal_activity_score: row.try_get("deal_activity_score")?,
            follow_up_intensity: row.try_get("follow_up_intensity")?,
            tags: tags.iter().filter_map(|t| ScoreTag::parse(t)).collect::<BTreeSet<_>>(),
        },
    })
}

#[async_trait]
impl SnapshotStore for PostgresSnapshotStore {
    #[instrument(
        skip(self, snapshot),
        fields(store_id = %snapshot.store_id, snapshot_date = %snapshot.snapshot_date),
        err
    )]
    async fn upsert(&self, snapshot: ScoreSnapshot) -> Result<ScoreSnapshot, StoreError> {
        let f = &snapshot.fields;
        let tags: Vec<String> = f.tags.iter().map(|t| t.as_str().to_string()).collect();

        let id: uuid::Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO score_snapshots (
                id, store_id, business_id, vertical_id, snapshot_date, computed_at,
                heat_score, churn_risk, order_prob_7d,
                avg_order_value, revenue_30d, revenue_90d, order_count_30d, order_count_90d,
                last_order_at, days_since_last_order, predicted_next_order_at,
                restock_window_start, restock_window_end,
                communication_score, sentiment_score, deal_activity_score, follow_up_intensity,
                tags
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                    $17, $18, $19, $20, $21, $22, $23, $24)
            ON CONFLICT (store_id, snapshot_date)
            DO UPDATE SET
                business_id = EXCLUDED.business_id,
                vertical_id = EXCLUDED.vertical_id,
                computed_at = EXCLUDED.computed_at,
                heat_score = EXCLUDED.heat_score,
                churn_risk = EXCLUDED.churn_risk,
                order_prob_7d = EXCLUDED.order_prob_7d,
                avg_order_value = EXCLUDED.avg_order_value,
                revenue_30d = EXCLUDED.revenue_30d,
                revenue_90d = EXCLUDED.revenue_90d,
                order_count_30d = EXCLUDED.order_count_30d,
                order_count_90d = EXCLUDED.order_count_90d,
                last_order_at = EXCLUDED.last_order_at,
                days_since_last_order = EXCLUDED.days_since_last_order,
                predicted_next_order_at = EXCLUDED.predicted_next_order_at,
                restock_window_start = EXCLUDED.restock_window_start,
                restock_window_end = EXCLUDED.restock_window_end,
                communication_score = EXCLUDED.communication_score,
                sentiment_score = EXCLUDED.sentiment_score,
                deal_activity_score = EXCLUDED.deal_activity_score,
                follow_up_intensity = EXCLUDED.follow_up_intensity,
                tags = EXCLUDED.tags
            RETURNING id
            "#,
        )
        .bind(snapshot.id.as_uuid())
        .bind(snapshot.store_id.as_uuid())
        .bind(snapshot.business_id.as_uuid())
        .bind(snapshot.vertical_id.map(uuid::Uuid::from))
        .bind(snapshot.snapshot_date)
        .bind(snapshot.computed_at)
        .bind(f.heat_score)
        .bind(f.churn_risk)
        .bind(f.order_prob_7d)
        .bind(f.avg_order_value)
        .bind(f.revenue_30d)
        .bind(f.revenue_90d)
        .bind(i32::try_from(f.order_count_30d).unwrap_or(i32::MAX))
        .bind(i32::try_from(f.order_count_90d).unwrap_or(i32::MAX))
        .bind(f.last_order_at)
        .bind(f.days_since_last_order)
        .bind(f.predicted_next_order_at)
        .bind(f.restock_window_start)
        .bind(f.restock_window_end)
        .bind(f.communication_score)
        .bind(f.sentiment_score)
        .bind(f.deal_activity_score)
        .bind(f.follow_up_intensity)
        .bind(&tags)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("upsert_snapshot", e))?;

        Ok(ScoreSnapshot {
            id: SnapshotId::from_uuid(id),
            ..snapshot
        })
    }

    async fn get(&self, store_id: StoreId, snapshot_date: NaiveDate) -> Result<Option<ScoreSnapshot>, StoreError> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM score_snapshots WHERE store_id = $1 AND snapshot_date = $2");
        let row = sqlx::query(&sql)
            .bind(store_id.as_uuid())
            .bind(snapshot_date)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_snapshot", e))?;

        row.as_ref()
            .map(snapshot_from_row)
            .transpose()
            .map_err(|e| map_sqlx_error("decode_snapshot", e))
    }

    #[instrument(skip(self), fields(snapshot_count = tracing::field::Empty), err)]
    async fn get_snapshots(&self, snapshot_date: NaiveDate, scope: StoreScope) -> Result<Vec<ScoreSnapshot>, StoreError> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM score_snapshots \
             WHERE snapshot_date = $1 \
               AND ($2::uuid IS NULL OR business_id = $2) \
               AND ($3::uuid IS NULL OR vertical_id = $3) \
             ORDER BY store_id ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(snapshot_date)
            .bind(scope.business_id.map(uuid::Uuid::from))
            .bind(scope.vertical_id.map(uuid::Uuid::from))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_snapshots", e))?;

        let snapshots = rows
            .iter()
            .map(snapshot_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| map_sqlx_error("decode_snapshot", e))?;

        Span::current().record("snapshot_count", snapshots.len());
        Ok(snapshots)
    }
}
