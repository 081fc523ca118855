pub mod analyze;
pub mod health;
pub mod score;
pub mod scoring_config;

use axum::extract::DefaultBodyLimit;
use axum::Router;

use crate::middleware::{rate_limit, request_id};
use crate::response::AppError;
use crate::state::AppState;

/// Maximum request body size: 2 MiB.
const MAX_BODY_SIZE: usize = 2 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .nest("/analyze", analyze::router())
        .nest("/score", score::router())
        .nest("/scoring/config", scoring_config::router())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit::rate_limit_middleware,
        ))
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE));

    Router::new()
        .nest("/api", api_routes)
        .nest("/health", health::router())
        .fallback(fallback_404)
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .with_state(state)
}

async fn fallback_404() -> AppError {
    AppError::not_found("Not found")
}
