use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(health_check))
        .route("/live", get(liveness))
        .route("/ready", get(readiness))
        .route("/metrics", get(metrics))
}

pub async fn health_check(State(state): State<AppState>) -> impl axum::response::IntoResponse {
    let config = state.engine().get_config();
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptimeSecs": state.uptime_secs(),
        "scoring": {
            "bodyPolicy": config.body.policy,
            "proportionMethod": config.body.proportion_method,
            "mirrorMatching": config.symmetry.matching,
            "jitterEnabled": config.jitter.enabled,
        }
    }))
}

pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// The engine has no external dependencies, so it is ready once the
/// configuration it holds is valid.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.engine().get_config().validate() {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::error!(error = %e, "Scoring config invalid, not ready");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

pub async fn metrics(State(state): State<AppState>) -> impl axum::response::IntoResponse {
    let snapshot = state.engine().metrics_registry().snapshot();
    Json(serde_json::json!({
        "scorers": snapshot,
    }))
}
