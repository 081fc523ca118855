//! Single-modality scoring endpoints. A modality that cannot be scored still
//! answers 200, with the `-1` sentinel and a status in the outcome.

use axum::extract::State;
use axum::routing::post;
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::extractors::JsonBody;
use crate::response::{ok, AppError};
use crate::scoring::composite::CompositeScore;
use crate::scoring::config::{FaceBlend, OverallBlend, ScoringConfig};
use crate::scoring::symmetry::SymmetryMeasurement;
use crate::scoring::types::{
    BodyLandmarks, EmotionProbabilities, FaceLandmarkSet, Gender, LandmarkPoint, Modality,
    ModalityOutcome, ProportionRecord, ScoreTriple,
};
use crate::state::AppState;
use crate::validation::{
    validate_body_landmarks, validate_component_score, validate_emotions, validate_face_sets,
    validate_pose_list,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/body", post(score_body))
        .route("/symmetry", post(score_symmetry))
        .route("/emotion", post(score_emotion))
        .route("/composite", post(score_composite))
}

/// Either named joints or a raw 33-point pose list.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BodyRequest {
    gender: String,
    #[serde(default)]
    landmarks: Option<BodyLandmarks>,
    #[serde(default)]
    pose_landmarks: Option<Vec<LandmarkPoint>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BodyResponse {
    outcome: ModalityOutcome,
    proportions: Option<ProportionRecord>,
}

async fn score_body(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<BodyRequest>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let gender: Gender = req.gender.parse()?;
    let landmarks = match (req.landmarks, req.pose_landmarks) {
        (Some(landmarks), None) => {
            validate_body_landmarks(&landmarks).map_err(AppError::validation)?;
            landmarks
        }
        (None, Some(points)) => {
            validate_pose_list(&points).map_err(AppError::validation)?;
            BodyLandmarks::from_pose_indices(&points)
        }
        (Some(_), Some(_)) => {
            return Err(AppError::validation(
                "send either landmarks or poseLandmarks, not both",
            ))
        }
        (None, None) => return Err(AppError::validation("landmarks are required")),
    };

    let result = state.engine().score_body(&landmarks, gender);
    let proportions = result.as_ref().ok().map(|a| a.proportions);
    let outcome = ModalityOutcome::from_result(Modality::Body, &result.map(|a| a.score));
    Ok(ok(BodyResponse {
        outcome,
        proportions,
    }))
}

#[derive(Debug, Deserialize)]
struct SymmetryRequest {
    faces: Vec<FaceLandmarkSet>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SymmetryResponse {
    outcome: ModalityOutcome,
    measurement: Option<SymmetryMeasurement>,
}

async fn score_symmetry(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<SymmetryRequest>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    validate_face_sets(&req.faces).map_err(AppError::validation)?;

    let result = state.engine().score_symmetry(&req.faces);
    let outcome = ModalityOutcome::from_result(
        Modality::Symmetry,
        &result.as_ref().map(|m| m.score).map_err(|e| e.clone()),
    );
    Ok(ok(SymmetryResponse {
        outcome,
        measurement: result.ok(),
    }))
}

#[derive(Debug, Deserialize)]
struct EmotionRequest {
    emotions: Vec<EmotionProbabilities>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmotionResponse {
    outcome: ModalityOutcome,
}

async fn score_emotion(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<EmotionRequest>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    validate_emotions(&req.emotions).map_err(AppError::validation)?;

    let result = state.engine().score_emotion(&req.emotions);
    Ok(ok(EmotionResponse {
        outcome: ModalityOutcome::from_result(Modality::Emotion, &result),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompositeRequest {
    body: f64,
    emotion: f64,
    symmetry: f64,
    #[serde(default)]
    face_blend: Option<FaceBlend>,
    #[serde(default)]
    overall_blend: Option<OverallBlend>,
}

async fn score_composite(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<CompositeRequest>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    for score in [req.body, req.emotion, req.symmetry] {
        validate_component_score(score).map_err(AppError::validation)?;
    }
    if req.face_blend.is_some() || req.overall_blend.is_some() {
        let mut candidate = ScoringConfig::default();
        if let Some(blend) = req.face_blend {
            candidate.face_blend = blend;
        }
        if let Some(blend) = req.overall_blend {
            candidate.overall_blend = blend;
        }
        candidate.validate().map_err(|e| AppError::validation(&e))?;
    }

    let scores = ScoreTriple {
        body: req.body,
        emotion: req.emotion,
        symmetry: req.symmetry,
    };
    let composite: CompositeScore =
        state
            .engine()
            .combine_with(&scores, req.face_blend, req.overall_blend);
    Ok(ok(composite))
}
