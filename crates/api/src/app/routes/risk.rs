use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use opsdeck_risk::{RiskInput, RiskSummary, assess_all};

use crate::app::dto::RiskAssessResponse;
use crate::app::errors;
use crate::app::services::AppServices;

/// `POST /risk/assess`: score a batch of tagged inputs with the configured bands.
pub async fn assess(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<Vec<RiskInput>>, JsonRejection>,
) -> Response {
    let Json(inputs) = match body {
        Ok(b) => b,
        Err(rejection) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", rejection.body_text());
        }
    };

    let assessments = assess_all(&inputs, services.risk_config());
    let summary = RiskSummary::from_assessments(&assessments);

    Json(RiskAssessResponse { assessments, summary }).into_response()
}
