use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use opsdeck_infra::EngineError;

pub fn engine_error_to_response(err: EngineError) -> axum::response::Response {
    let status = match &err {
        EngineError::NotFound(_) => StatusCode::NOT_FOUND,
        EngineError::Validation(_) => StatusCode::BAD_REQUEST,
        EngineError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::Upstream(_) => StatusCode::BAD_GATEWAY,
    };
    if status.is_server_error() {
        tracing::warn!(error = %err, code = err.code(), "engine request failed");
    }
    json_error(status, err.code(), err.to_string())
}

/// Error body shared by every endpoint: `{ "error": <message>, "code": <code> }`.
pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": message.into(),
            "code": code,
        })),
    )
        .into_response()
}
