use axum::{
    Router,
    routing::{get, post},
};

pub mod engine;
pub mod risk;
pub mod snapshots;
pub mod system;

/// Router for every endpoint except `/health`.
pub fn router() -> Router {
    Router::new()
        .route("/engine", post(engine::handle))
        .route("/risk/assess", post(risk::assess))
        .route("/snapshots", get(snapshots::list))
}
