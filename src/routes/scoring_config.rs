use axum::extract::State;
use axum::routing::get;
use axum::Router;

use crate::extractors::JsonBody;
use crate::response::{ok, AppError};
use crate::scoring::config::ScoringConfig;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_config).put(update_config))
}

async fn get_config(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    Ok(ok(state.engine().get_config()))
}

async fn update_config(
    State(state): State<AppState>,
    JsonBody(config): JsonBody<ScoringConfig>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    if !state.config_updates_allowed() {
        return Err(AppError::forbidden(
            "Scoring config updates are disabled (SCORING_ALLOW_CONFIG_UPDATES)",
        ));
    }

    state
        .engine()
        .reload_config(config)
        .map_err(|e| AppError::validation(&e))?;
    Ok(ok(state.engine().get_config()))
}
