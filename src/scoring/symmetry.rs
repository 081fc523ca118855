//! Facial symmetry from a mirror comparison of landmark points.
//!
//! The selected landmark groups are flattened into one point list, reflected
//! across the vertical midline of their bounding box, and the mean distance
//! between each point and its mirror partner is divided by the bounding-box
//! diagonal. That normalized error is mapped onto the score range by a
//! clamped linear curve.

use serde::{Deserialize, Serialize};

use crate::scoring::config::{MirrorMatching, SymmetryConfig};
use crate::scoring::geometry::{BoundingBox, Point};
use crate::scoring::types::{FaceFeature, FaceLandmarkSet};
use crate::scoring::ScoringError;

/// Groups compared against their reflection, in flattening order.
pub const SYMMETRY_FEATURES: [FaceFeature; 5] = [
    FaceFeature::LeftEye,
    FaceFeature::RightEye,
    FaceFeature::NoseBridge,
    FaceFeature::TopLip,
    FaceFeature::BottomLip,
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymmetryMeasurement {
    pub midline: f64,
    pub symmetry_error: f64,
    pub normalization_factor: f64,
    pub normalized_error: f64,
    pub point_count: usize,
    pub score: f64,
}

/// Measure the first detected face; further faces are ignored.
pub fn measure(
    faces: &[FaceLandmarkSet],
    config: &SymmetryConfig,
) -> Result<SymmetryMeasurement, ScoringError> {
    let face = faces.first().ok_or(ScoringError::NoFaceDetected)?;
    measure_face(face, config)
}

pub fn measure_face(
    face: &FaceLandmarkSet,
    config: &SymmetryConfig,
) -> Result<SymmetryMeasurement, ScoringError> {
    let points = keypoints(face)?;
    let bounds = BoundingBox::enclosing(&points).ok_or(ScoringError::NoFaceDetected)?;

    let normalization_factor = bounds.diagonal();
    if !(normalization_factor.is_finite() && normalization_factor > 0.0) {
        return Err(ScoringError::DegenerateGeometry);
    }

    let midline = bounds.center_x();
    let mirrored: Vec<Point> = points.iter().map(|p| p.reflect_x(midline)).collect();

    let symmetry_error = match config.matching {
        MirrorMatching::IndexAligned => index_aligned_error(&points, &mirrored),
        MirrorMatching::NearestNeighbor => nearest_neighbor_error(&points, &mirrored),
    };
    let normalized_error = symmetry_error / normalization_factor;
    if !normalized_error.is_finite() {
        return Err(ScoringError::DegenerateGeometry);
    }

    Ok(SymmetryMeasurement {
        midline,
        symmetry_error,
        normalization_factor,
        normalized_error,
        point_count: points.len(),
        score: linear_score(normalized_error, config),
    })
}

fn keypoints(face: &FaceLandmarkSet) -> Result<Vec<Point>, ScoringError> {
    let mut points = Vec::new();
    for feature in SYMMETRY_FEATURES {
        match face.group(feature) {
            Some(group) if !group.is_empty() => points.extend_from_slice(group),
            _ => return Err(ScoringError::MissingFeature(feature)),
        }
    }
    Ok(points)
}

fn index_aligned_error(points: &[Point], mirrored: &[Point]) -> f64 {
    let total: f64 = points
        .iter()
        .zip(mirrored)
        .map(|(p, m)| p.distance(m))
        .sum();
    total / points.len() as f64
}

fn nearest_neighbor_error(points: &[Point], mirrored: &[Point]) -> f64 {
    let total: f64 = points
        .iter()
        .map(|p| {
            mirrored
                .iter()
                .map(|m| p.distance(m))
                .fold(f64::INFINITY, f64::min)
        })
        .sum();
    total / points.len() as f64
}

/// `min_error` and below maps to `max_score`, `max_error` and above to
/// `min_score`, linear in between.
pub fn linear_score(normalized_error: f64, config: &SymmetryConfig) -> f64 {
    let slope = -(config.max_score - config.min_score) / (config.max_error - config.min_error);
    let score = slope * (normalized_error - config.min_error) + config.max_score;
    score.clamp(config.min_score, config.max_score)
}
