//! Postgres-backed upstream reads.
//!
//! Reads the CRM/ordering tables owned by other systems; never writes.
//! Failed reads surface as [`UpstreamError`], empty result sets do not.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::instrument;

use opsdeck_core::{BusinessId, StoreId, VerticalId};
use opsdeck_scoring::{
    DealRecord, DealStage, LifecycleStatus, OrderRecord, SignalSource, Store, StoreDirectory, StoreScope,
    UpstreamError,
};

#[derive(Debug, Clone)]
pub struct PostgresSignalSource {
    pool: Arc<PgPool>,
}

impl PostgresSignalSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }
}

fn upstream(source_name: &'static str) -> impl FnOnce(sqlx::Error) -> UpstreamError {
    move |e| UpstreamError::unavailable(source_name, e.to_string())
}

fn store_from_row(row: &sqlx::postgres::PgRow) -> Result<Store, sqlx::Error> {
    let status: String = row.try_get("status")?;
    Ok(Store {
        id: StoreId::from_uuid(row.try_get("id")?),
        business_id: BusinessId::from_uuid(row.try_get("business_id")?),
        vertical_id: row.try_get::<Option<uuid::Uuid>, _>("vertical_id")?.map(VerticalId::from_uuid),
        name: row.try_get("name")?,
        // Unknown CRM statuses are treated as not scoreable.
        status: LifecycleStatus::parse(&status).unwrap_or(LifecycleStatus::Inactive),
        last_order_at: row.try_get("last_order_at")?,
        last_visit_at: row.try_get("last_visit_at")?,
    })
}

#[async_trait]
impl StoreDirectory for PostgresSignalSource {
    #[instrument(skip(self), fields(store_id = %store_id), err)]
    async fn get_store(&self, store_id: StoreId) -> Result<Option<Store>, UpstreamError> {
        let row = sqlx::query(
            r#"
            SELECT id, business_id, vertical_id, name, status, last_order_at, last_visit_at
            FROM stores
            WHERE id = $1
            "#,
        )
        .bind(store_id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(upstream("stores"))?;

        row.as_ref()
            .map(store_from_row)
            .transpose()
            .map_err(upstream("stores"))
    }

    #[instrument(skip(self), err)]
    async fn list_scoreable(&self, scope: StoreScope) -> Result<Vec<Store>, UpstreamError> {
        let rows = sqlx::query(
            r#"
            SELECT id, business_id, vertical_id, name, status, last_order_at, last_visit_at
            FROM stores
            WHERE status IN ('active', 'prospect')
              AND ($1::uuid IS NULL OR business_id = $1)
              AND ($2::uuid IS NULL OR vertical_id = $2)
            ORDER BY id ASC
            "#,
        )
        .bind(scope.business_id.map(uuid::Uuid::from))
        .bind(scope.vertical_id.map(uuid::Uuid::from))
        .fetch_all(&*self.pool)
        .await
        .map_err(upstream("stores"))?;

        rows.iter()
            .map(store_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(upstream("stores"))
    }
}

#[async_trait]
impl SignalSource for PostgresSignalSource {
    async fn orders_since(&self, store_id: StoreId, since: DateTime<Utc>) -> Result<Vec<OrderRecord>, UpstreamError> {
        let rows = sqlx::query(
            r#"
            SELECT total::float8 AS total, placed_at
            FROM orders
            WHERE store_id = $1 AND placed_at >= $2 AND status = 'completed'
            "#,
        )
        .bind(store_id.as_uuid())
        .bind(since)
        .fetch_all(&*self.pool)
        .await
        .map_err(upstream("orders"))?;

        rows.iter()
            .map(|r| {
                Ok(OrderRecord {
                    store_id,
                    total: r.try_get("total")?,
                    placed_at: r.try_get("placed_at")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(upstream("orders"))
    }

    async fn sentiment_since(&self, store_id: StoreId, since: DateTime<Utc>) -> Result<Vec<f64>, UpstreamError> {
        let rows = sqlx::query(
            r#"
            SELECT sentiment_score::float8 AS sentiment_score
            FROM interaction_analytics
            WHERE store_id = $1 AND occurred_at >= $2 AND sentiment_score IS NOT NULL
            "#,
        )
        .bind(store_id.as_uuid())
        .bind(since)
        .fetch_all(&*self.pool)
        .await
        .map_err(upstream("sentiment"))?;

        rows.iter()
            .map(|r| r.try_get::<f64, _>("sentiment_score"))
            .collect::<Result<Vec<_>, _>>()
            .map_err(upstream("sentiment"))
    }

    async fn deals_since(&self, store_id: StoreId, since: DateTime<Utc>) -> Result<Vec<DealRecord>, UpstreamError> {
        let rows = sqlx::query(
            r#"
            SELECT stage, updated_at
            FROM deals
            WHERE store_id = $1 AND updated_at >= $2
            "#,
        )
        .bind(store_id.as_uuid())
        .bind(since)
        .fetch_all(&*self.pool)
        .await
        .map_err(upstream("deals"))?;

        let mut deals = Vec::with_capacity(rows.len());
        for r in &rows {
            let stage: String = r.try_get("stage").map_err(upstream("deals"))?;
            // Stages outside the pipeline vocabulary don't count toward activity.
            let Some(stage) = DealStage::parse(&stage) else {
                continue;
            };
            deals.push(DealRecord {
                store_id,
                stage,
                updated_at: r.try_get("updated_at").map_err(upstream("deals"))?,
            });
        }
        Ok(deals)
    }

    async fn followups_since(&self, store_id: StoreId, since: DateTime<Utc>) -> Result<u32, UpstreamError> {
        let n: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM followup_queue
            WHERE store_id = $1 AND created_at >= $2
            "#,
        )
        .bind(store_id.as_uuid())
        .bind(since)
        .fetch_one(&*self.pool)
        .await
        .map_err(upstream("followups"))?;

        Ok(u32::try_from(n).unwrap_or(u32::MAX))
    }
}
