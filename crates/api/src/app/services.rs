use std::sync::Arc;

use anyhow::Context;
use sqlx::PgPool;

use opsdeck_infra::{
    EngineConfig, ScoringEngine,
    recommendations::{InMemoryRecommendationStore, PostgresRecommendationStore},
    snapshots::{InMemorySnapshotStore, PostgresSnapshotStore},
    sources::{InMemorySignalSource, PostgresSignalSource},
};
use opsdeck_risk::RiskConfig;

/// Composition root: owns the engine and the risk configuration.
#[derive(Clone)]
pub enum AppServices {
    InMemory {
        engine: ScoringEngine,
        /// Seedable upstream (local runs and tests).
        source: Arc<InMemorySignalSource>,
        risk: Arc<RiskConfig>,
    },
    Persistent {
        engine: ScoringEngine,
        pool: PgPool,
        risk: Arc<RiskConfig>,
    },
}

impl AppServices {
    /// In-memory wiring with an empty upstream.
    pub fn in_memory(concurrency: usize) -> Self {
        let recommendations = Arc::new(InMemoryRecommendationStore::new());
        let source = Arc::new(InMemorySignalSource::new().with_followup_queue(recommendations.clone()));
        let engine = ScoringEngine::new(source.clone(), Arc::new(InMemorySnapshotStore::new()), recommendations)
        .with_concurrency(concurrency);

        AppServices::InMemory {
            engine,
            source,
            risk: Arc::new(RiskConfig::default()),
        }
    }

    pub fn persistent(pool: PgPool, concurrency: usize) -> Self {
        let engine = ScoringEngine::new(
            Arc::new(PostgresSignalSource::new(pool.clone())),
            Arc::new(PostgresSnapshotStore::new(pool.clone())),
            Arc::new(PostgresRecommendationStore::new(pool.clone())),
        )
        .with_concurrency(concurrency);

        AppServices::Persistent {
            engine,
            pool,
            risk: Arc::new(RiskConfig::default()),
        }
    }

    pub fn engine(&self) -> &ScoringEngine {
        match self {
            AppServices::InMemory { engine, .. } | AppServices::Persistent { engine, .. } => engine,
        }
    }

    pub fn risk_config(&self) -> &RiskConfig {
        match self {
            AppServices::InMemory { risk, .. } | AppServices::Persistent { risk, .. } => risk,
        }
    }

    /// Round-trip to the database when persistent; in-memory is always ready.
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        match self {
            AppServices::InMemory { .. } => Ok(()),
            AppServices::Persistent { pool, .. } => sqlx::query("SELECT 1").execute(pool).await.map(|_| ()),
        }
    }

    /// The seedable upstream, when running in-memory.
    pub fn signal_source(&self) -> Option<&Arc<InMemorySignalSource>> {
        match self {
            AppServices::InMemory { source, .. } => Some(source),
            AppServices::Persistent { .. } => None,
        }
    }
}

/// Build services from configuration.
///
/// `use_persistent_stores = false` gives the in-memory wiring. Otherwise a
/// Postgres pool is opened against `database_url`; the schema in
/// `migrations/` is expected to be applied already.
pub async fn build_services(config: &EngineConfig) -> anyhow::Result<AppServices> {
    if !config.use_persistent_stores {
        tracing::info!("using in-memory stores");
        return Ok(AppServices::in_memory(config.score_all_concurrency));
    }

    let database_url = config
        .database_url
        .as_deref()
        .context("DATABASE_URL must be set when USE_PERSISTENT_STORES=true")?;

    let pool = PgPool::connect(database_url)
        .await
        .context("failed to connect to Postgres")?;

    tracing::info!("using Postgres stores");
    Ok(AppServices::persistent(pool, config.score_all_concurrency))
}
