pub mod body;
pub mod composite;
pub mod config;
pub mod detector;
pub mod emotion;
pub mod engine;
pub mod geometry;
pub mod jitter;
pub mod metrics;
pub mod symmetry;
pub mod types;

use thiserror::Error;

use crate::scoring::types::{BodyJoint, FaceFeature};

/// Score reported for a modality that could not be computed.
pub const FAILURE_SENTINEL: f64 = -1.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoringError {
    #[error("full body not visible: missing {}", joint_list(.missing))]
    BodyNotVisible { missing: Vec<BodyJoint> },
    #[error("no person detected")]
    NoPersonDetected,
    #[error("no face landmarks found")]
    NoFaceDetected,
    #[error("no emotion result returned")]
    NoEmotionResult,
    #[error("face landmark group `{0}` is missing or empty")]
    MissingFeature(FaceFeature),
    #[error("invalid face region (zero bounding box)")]
    DegenerateGeometry,
    #[error("invalid gender `{0}`: expected `male` or `female`")]
    InvalidGender(String),
    #[error("{detector} failed: {message}")]
    UpstreamFailure { detector: String, message: String },
    #[error("invalid scoring config: {0}")]
    InvalidConfig(String),
}

impl ScoringError {
    /// Stable status label reported next to a sentinel score.
    pub fn status(&self) -> &'static str {
        match self {
            ScoringError::BodyNotVisible { .. } => "not_visible",
            ScoringError::NoPersonDetected
            | ScoringError::NoFaceDetected
            | ScoringError::NoEmotionResult => "not_detected",
            ScoringError::MissingFeature(_) | ScoringError::DegenerateGeometry => "degenerate",
            ScoringError::InvalidGender(_) | ScoringError::InvalidConfig(_) => "invalid_input",
            ScoringError::UpstreamFailure { .. } => "failed",
        }
    }
}

fn joint_list(joints: &[BodyJoint]) -> String {
    joints
        .iter()
        .map(|j| j.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_visible_message_lists_joints() {
        let err = ScoringError::BodyNotVisible {
            missing: vec![BodyJoint::LeftKnee, BodyJoint::RightAnkle],
        };
        assert_eq!(
            err.to_string(),
            "full body not visible: missing left_knee, right_ankle"
        );
        assert_eq!(err.status(), "not_visible");
    }

    #[test]
    fn degenerate_and_upstream_statuses() {
        assert_eq!(ScoringError::DegenerateGeometry.status(), "degenerate");
        let err = ScoringError::UpstreamFailure {
            detector: "emotion classifier".to_string(),
            message: "model not loaded".to_string(),
        };
        assert_eq!(err.status(), "failed");
        assert_eq!(err.to_string(), "emotion classifier failed: model not loaded");
    }
}
