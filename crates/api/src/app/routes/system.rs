use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode};

use crate::app::services::AppServices;

/// 200 when the backing store answers, 503 otherwise.
pub async fn health(Extension(services): Extension<Arc<AppServices>>) -> StatusCode {
    match services.ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "health check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
