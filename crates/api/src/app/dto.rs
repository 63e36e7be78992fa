use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use opsdeck_core::{BusinessId, StoreId, VerticalId};
use opsdeck_infra::engine::{RecommendOutcome, ScoreOutcome, SyncOutcome};
use opsdeck_risk::{RiskAssessment, RiskSummary};
use opsdeck_scoring::{ScoreSnapshot, StoreScope};

/// `POST /engine` body: `{ "action": ..., ...params }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum EngineRequest {
    ScoreStore(ScoreStoreParams),
    ScoreAll(ScopeParams),
    GenerateRecommendations(GenerateParams),
    SyncToFollowup(SyncParams),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreStoreParams {
    pub store_id: StoreId,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeParams {
    pub business_id: Option<BusinessId>,
    pub vertical_id: Option<VerticalId>,
}

impl From<ScopeParams> for StoreScope {
    fn from(p: ScopeParams) -> Self {
        StoreScope {
            business_id: p.business_id,
            vertical_id: p.vertical_id,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateParams {
    #[serde(flatten)]
    pub scope: ScopeParams,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncParams {
    pub store_id: Option<StoreId>,
}

#[derive(Debug, Serialize)]
pub struct ScoreStoreResponse {
    pub success: bool,
    pub score: ScoreSnapshot,
}

#[derive(Debug, Serialize)]
pub struct ScoreAllResponse {
    pub success: bool,
    pub scored: usize,
    pub failed: usize,
    pub outcomes: Vec<ScoreOutcome>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub success: bool,
    pub recommendations: usize,
    pub skipped: usize,
    pub failed: usize,
    pub outcomes: Vec<RecommendOutcome>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    pub success: bool,
    pub synced: usize,
    pub already_synced: usize,
    pub failed: usize,
    pub outcomes: Vec<SyncOutcome>,
}

#[derive(Debug, Serialize)]
pub struct RiskAssessResponse {
    pub assessments: Vec<RiskAssessment>,
    pub summary: RiskSummary,
}

/// `GET /snapshots` query string.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotQuery {
    pub date: Option<NaiveDate>,
    pub business_id: Option<BusinessId>,
    pub vertical_id: Option<VerticalId>,
}

#[derive(Debug, Serialize)]
pub struct SnapshotListResponse {
    pub date: NaiveDate,
    pub snapshots: Vec<ScoreSnapshot>,
}
