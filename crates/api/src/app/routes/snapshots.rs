use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Query, rejection::QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;

use opsdeck_infra::EngineError;
use opsdeck_infra::snapshots::SnapshotStore;
use opsdeck_scoring::StoreScope;

use crate::app::dto::{SnapshotListResponse, SnapshotQuery};
use crate::app::errors;
use crate::app::services::AppServices;

/// `GET /snapshots`: snapshots for one date (today by default) within a scope.
pub async fn list(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<SnapshotQuery>, QueryRejection>,
) -> Response {
    let Query(q) = match query {
        Ok(q) => q,
        Err(rejection) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", rejection.body_text());
        }
    };
    let date = q.date.unwrap_or_else(|| Utc::now().date_naive());
    let scope = StoreScope {
        business_id: q.business_id,
        vertical_id: q.vertical_id,
    };

    match services.engine().snapshots().get_snapshots(date, scope).await {
        Ok(snapshots) => Json(SnapshotListResponse { date, snapshots }).into_response(),
        Err(e) => errors::engine_error_to_response(EngineError::from(e)),
    }
}
