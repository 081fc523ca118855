pub mod policy;
pub mod proportions;

use serde::{Deserialize, Serialize};

use crate::scoring::config::BodyModelConfig;
use crate::scoring::jitter::Jitter;
use crate::scoring::types::{BodyLandmarks, Gender, ProportionRecord};
use crate::scoring::ScoringError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BodyAssessment {
    pub proportions: ProportionRecord,
    pub score: f64,
}

/// Visibility gate, proportion extraction and scoring in one step.
pub fn assess(
    landmarks: &BodyLandmarks,
    gender: Gender,
    config: &BodyModelConfig,
    jitter: &mut Jitter,
) -> Result<BodyAssessment, ScoringError> {
    let body = landmarks.full_body(config.visibility_threshold)?;
    let proportions = proportions::extract(&body, config.proportion_method);
    let score = policy::score(&proportions, gender, config, jitter);
    Ok(BodyAssessment { proportions, score })
}
