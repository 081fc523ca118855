/// Sanity checks for detector payloads arriving over HTTP.
///
/// These reject malformed input (non-finite coordinates, out-of-range
/// probabilities, oversized payloads) before it reaches the scoring core.
/// A detector *miss* is not malformed and is never rejected here.
use crate::constants::{MAX_EMOTION_PERCENT, MAX_FACES_PER_IMAGE, MAX_POINTS_PER_FACE};
use crate::scoring::types::{
    AnalysisRequest, BodyLandmarks, Detection, EmotionProbabilities, FaceLandmarkSet,
    LandmarkPoint,
};
use crate::scoring::FAILURE_SENTINEL;

pub fn validate_landmark(point: &LandmarkPoint) -> Result<(), &'static str> {
    if !(point.x.is_finite() && point.y.is_finite()) {
        return Err("landmark coordinates must be finite numbers");
    }
    if !(0.0..=1.0).contains(&point.visibility) {
        return Err("landmark visibility must be in [0,1]");
    }
    Ok(())
}

pub fn validate_body_landmarks(landmarks: &BodyLandmarks) -> Result<(), &'static str> {
    landmarks.iter().try_for_each(|(_, p)| validate_landmark(p))
}

pub fn validate_pose_list(points: &[LandmarkPoint]) -> Result<(), &'static str> {
    if points.len() > 64 {
        return Err("pose landmark list is too long");
    }
    points.iter().try_for_each(validate_landmark)
}

pub fn validate_face_sets(faces: &[FaceLandmarkSet]) -> Result<(), &'static str> {
    if faces.len() > MAX_FACES_PER_IMAGE {
        return Err("too many faces in one payload");
    }
    for face in faces {
        if face.point_count() > MAX_POINTS_PER_FACE {
            return Err("too many landmark points for one face");
        }
        if !face.points().all(|p| p.is_finite()) {
            return Err("face landmark coordinates must be finite numbers");
        }
    }
    Ok(())
}

pub fn validate_emotions(faces: &[EmotionProbabilities]) -> Result<(), &'static str> {
    if faces.len() > MAX_FACES_PER_IMAGE {
        return Err("too many faces in one payload");
    }
    let in_range = |v: &f64| (0.0..=MAX_EMOTION_PERCENT).contains(v);
    if !faces.iter().all(|p| p.values().iter().all(in_range)) {
        return Err("emotion percentages must be in [0,100]");
    }
    Ok(())
}

/// A component score is either in [0,100] or exactly the failure sentinel.
pub fn validate_component_score(score: f64) -> Result<(), &'static str> {
    if score == FAILURE_SENTINEL || (0.0..=100.0).contains(&score) {
        Ok(())
    } else {
        Err("scores must be in [0,100] or -1")
    }
}

pub fn validate_analysis_request(request: &AnalysisRequest) -> Result<(), &'static str> {
    if let Some(Detection::Found(landmarks)) = &request.body {
        validate_body_landmarks(landmarks)?;
    }
    if let Some(Detection::Found(emotions)) = &request.emotions {
        validate_emotions(emotions)?;
    }
    if let Some(Detection::Found(faces)) = &request.face_landmarks {
        validate_face_sets(faces)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::geometry::Point;
    use crate::scoring::types::{BodyJoint, FaceFeature, Gender};

    #[test]
    fn valid_landmark_accepted() {
        assert!(validate_landmark(&LandmarkPoint::new(0.2, 0.4, 0.9)).is_ok());
    }

    #[test]
    fn nan_coordinate_rejected() {
        assert!(validate_landmark(&LandmarkPoint::new(f64::NAN, 0.4, 0.9)).is_err());
    }

    #[test]
    fn visibility_out_of_range_rejected() {
        assert!(validate_landmark(&LandmarkPoint::new(0.2, 0.4, 1.5)).is_err());
        assert!(validate_landmark(&LandmarkPoint::new(0.2, 0.4, -0.1)).is_err());
    }

    #[test]
    fn body_map_checks_every_joint() {
        let body = BodyLandmarks::new()
            .with(BodyJoint::Nose, LandmarkPoint::new(0.5, 0.1, 0.9))
            .with(BodyJoint::LeftKnee, LandmarkPoint::new(f64::INFINITY, 0.1, 0.9));
        assert!(validate_body_landmarks(&body).is_err());
    }

    #[test]
    fn too_many_faces_rejected() {
        let faces = vec![FaceLandmarkSet::new(); MAX_FACES_PER_IMAGE + 1];
        assert!(validate_face_sets(&faces).is_err());
    }

    #[test]
    fn oversized_face_rejected() {
        let face = FaceLandmarkSet::new().with(
            FaceFeature::Chin,
            vec![Point::new(1.0, 1.0); MAX_POINTS_PER_FACE + 1],
        );
        assert!(validate_face_sets(&[face]).is_err());
    }

    #[test]
    fn emotion_range_enforced() {
        let ok = EmotionProbabilities {
            happy: 100.0,
            ..Default::default()
        };
        assert!(validate_emotions(&[ok]).is_ok());
        let bad = EmotionProbabilities {
            sad: 120.0,
            ..Default::default()
        };
        assert!(validate_emotions(&[bad]).is_err());
    }

    #[test]
    fn component_scores() {
        assert!(validate_component_score(-1.0).is_ok());
        assert!(validate_component_score(0.0).is_ok());
        assert!(validate_component_score(100.0).is_ok());
        assert!(validate_component_score(-0.5).is_err());
        assert!(validate_component_score(f64::NAN).is_err());
    }

    #[test]
    fn misses_are_not_malformed() {
        let request = AnalysisRequest {
            body: Some(Detection::Missing),
            emotions: Some(Detection::Failed("timeout".to_string())),
            face_landmarks: Some(Detection::Found(vec![])),
            ..AnalysisRequest::new(Gender::Female)
        };
        assert!(validate_analysis_request(&request).is_ok());
    }
}
