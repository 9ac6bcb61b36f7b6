pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::scoring::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Analysis API
        .route(
            "/api/v1/analyze/batch",
            post(handlers::handle_analyze_batch),
        )
        .route(
            "/api/v1/analyze/resume",
            post(handlers::handle_analyze_resume),
        )
        .route("/api/v1/jobs/:id", get(handlers::handle_get_job))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
