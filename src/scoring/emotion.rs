use crate::scoring::config::EmotionWeights;
use crate::scoring::types::EmotionProbabilities;
use crate::scoring::ScoringError;

/// Weighted sum of the emotion percentages, clamped to [0, 100].
pub fn score(probabilities: &EmotionProbabilities, weights: &EmotionWeights) -> f64 {
    let total: f64 = probabilities
        .values()
        .iter()
        .zip(weights.as_array())
        .filter(|(p, _)| p.is_finite())
        .map(|(p, w)| p * w)
        .sum();
    total.clamp(0.0, 100.0)
}

/// Scores the first face's probabilities.
pub fn score_first(
    faces: &[EmotionProbabilities],
    weights: &EmotionWeights,
) -> Result<f64, ScoringError> {
    faces
        .first()
        .map(|p| score(p, weights))
        .ok_or(ScoringError::NoEmotionResult)
}
