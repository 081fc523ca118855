use axum::extract::State;
use axum::routing::post;
use axum::Router;
use serde::Deserialize;

use crate::extractors::JsonBody;
use crate::response::{ok, AppError};
use crate::scoring::types::{
    AnalysisRequest, BodyLandmarks, Detection, EmotionProbabilities, FaceLandmarkSet, Gender,
};
use crate::state::AppState;
use crate::validation::validate_analysis_request;

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(analyze))
}

/// Gender arrives as free text so an unknown value is reported as
/// `INVALID_GENDER` rather than a generic body error.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeRequest {
    gender: String,
    #[serde(default)]
    body: Option<Detection<BodyLandmarks>>,
    #[serde(default)]
    emotions: Option<Detection<Vec<EmotionProbabilities>>>,
    #[serde(default)]
    face_landmarks: Option<Detection<Vec<FaceLandmarkSet>>>,
}

impl AnalyzeRequest {
    fn into_analysis(self) -> Result<AnalysisRequest, AppError> {
        let gender: Gender = self.gender.parse()?;
        Ok(AnalysisRequest {
            gender,
            body: self.body,
            emotions: self.emotions,
            face_landmarks: self.face_landmarks,
        })
    }
}

async fn analyze(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<AnalyzeRequest>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let request = req.into_analysis()?;
    validate_analysis_request(&request).map_err(AppError::validation)?;

    let report = state.engine().analyze(&request);
    Ok(ok(report))
}
