use serde::{Deserialize, Serialize};

use crate::scoring::config::{FaceBlend, OverallBlend};
use crate::scoring::types::ScoreTriple;
use crate::scoring::FAILURE_SENTINEL;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeScore {
    pub face: f64,
    pub overall: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CompositeScorer {
    pub face_blend: FaceBlend,
    pub overall_blend: OverallBlend,
}

impl CompositeScorer {
    pub fn new(face_blend: FaceBlend, overall_blend: OverallBlend) -> Self {
        Self {
            face_blend,
            overall_blend,
        }
    }

    pub fn combine(&self, scores: &ScoreTriple) -> CompositeScore {
        let face = self.face(scores.emotion_score(), scores.symmetry_score());
        let overall = self.overall(face, scores.body_score());
        CompositeScore {
            face: face.unwrap_or(FAILURE_SENTINEL),
            overall: overall.unwrap_or(FAILURE_SENTINEL),
        }
    }

    /// `None` when a component that carries weight is unavailable.
    ///
    /// The result is clamped to [0, 100]; without the clamp the default
    /// offset lets a perfect face reach 103.
    pub fn face(&self, emotion: Option<f64>, symmetry: Option<f64>) -> Option<f64> {
        let blend = &self.face_blend;
        let emotion_part = weighted(blend.emotion_weight, emotion)?;
        let symmetry_part = weighted(
            blend.symmetry_weight,
            symmetry.map(|s| s + blend.symmetry_offset),
        )?;
        Some((emotion_part + symmetry_part).clamp(0.0, 100.0))
    }

    /// Weighted mean over whichever components are available.
    pub fn overall(&self, face: Option<f64>, body: Option<f64>) -> Option<f64> {
        let blend = &self.overall_blend;
        let parts = [(blend.face_weight, face), (blend.body_weight, body)];
        let (sum, weight) = parts
            .iter()
            .filter_map(|(w, v)| v.map(|v| (w * v, *w)))
            .fold((0.0, 0.0), |(s, tw), (wv, w)| (s + wv, tw + w));
        (weight > 0.0).then(|| (sum / weight).clamp(0.0, 100.0))
    }
}

fn weighted(weight: f64, value: Option<f64>) -> Option<f64> {
    if weight == 0.0 {
        return Some(0.0);
    }
    value.map(|v| weight * v)
}
