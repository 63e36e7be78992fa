use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;

use opsdeck_infra::{EngineError, ScoringEngine};

use crate::app::dto::{
    EngineRequest, GenerateResponse, ScoreAllResponse, ScoreStoreResponse, SyncResponse,
};
use crate::app::errors;
use crate::app::services::AppServices;

/// `POST /engine`: dispatch on the `action` field.
///
/// A body that does not name a known action, or whose params do not parse,
/// is rejected with 400 before the engine is touched.
pub async fn handle(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> Response {
    let Json(raw) = match body {
        Ok(b) => b,
        Err(rejection) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", rejection.body_text());
        }
    };

    let request: EngineRequest = match serde_json::from_value(raw) {
        Ok(r) => r,
        Err(e) => {
            return errors::engine_error_to_response(EngineError::Validation(e.to_string()));
        }
    };

    match dispatch(services.engine(), request).await {
        Ok(resp) => resp,
        Err(e) => errors::engine_error_to_response(e),
    }
}

async fn dispatch(engine: &ScoringEngine, request: EngineRequest) -> Result<Response, EngineError> {
    let now = Utc::now();

    let resp = match request {
        EngineRequest::ScoreStore(p) => {
            let score = engine.score_store(p.store_id, now).await?;
            Json(ScoreStoreResponse { success: true, score }).into_response()
        }
        EngineRequest::ScoreAll(p) => {
            let report = engine.score_all(p.into(), now).await?;
            Json(ScoreAllResponse {
                success: true,
                scored: report.scored(),
                failed: report.failed(),
                outcomes: report.outcomes,
            })
            .into_response()
        }
        EngineRequest::GenerateRecommendations(p) => {
            let report = engine.generate_recommendations(p.date, p.scope.into(), now).await?;
            Json(GenerateResponse {
                success: true,
                recommendations: report.created(),
                skipped: report.skipped(),
                failed: report.failed(),
                outcomes: report.outcomes,
            })
            .into_response()
        }
        EngineRequest::SyncToFollowup(p) => {
            let report = engine.sync_to_followup(p.store_id, now).await?;
            Json(SyncResponse {
                success: true,
                synced: report.synced(),
                already_synced: report.already_synced(),
                failed: report.failed(),
                outcomes: report.outcomes,
            })
            .into_response()
        }
    };

    Ok(resp)
}
