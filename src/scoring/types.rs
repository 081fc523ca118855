use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::scoring::geometry::Point;
use crate::scoring::symmetry::SymmetryMeasurement;
use crate::scoring::{ScoringError, FAILURE_SENTINEL};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

impl FromStr for Gender {
    type Err = ScoringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            _ => Err(ScoringError::InvalidGender(s.to_string())),
        }
    }
}

/// A pose landmark in normalized image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LandmarkPoint {
    pub x: f64,
    pub y: f64,
    pub visibility: f64,
}

impl LandmarkPoint {
    pub const fn new(x: f64, y: f64, visibility: f64) -> Self {
        Self { x, y, visibility }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    fn is_visible(&self, threshold: f64) -> bool {
        self.visibility > threshold && self.x.is_finite() && self.y.is_finite()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyJoint {
    Nose,
    LeftShoulder,
    RightShoulder,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

impl BodyJoint {
    /// The joints that must all be visible for a full-body reading.
    pub const ALL: [BodyJoint; 9] = [
        BodyJoint::Nose,
        BodyJoint::LeftShoulder,
        BodyJoint::RightShoulder,
        BodyJoint::LeftHip,
        BodyJoint::RightHip,
        BodyJoint::LeftKnee,
        BodyJoint::RightKnee,
        BodyJoint::LeftAnkle,
        BodyJoint::RightAnkle,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BodyJoint::Nose => "nose",
            BodyJoint::LeftShoulder => "left_shoulder",
            BodyJoint::RightShoulder => "right_shoulder",
            BodyJoint::LeftHip => "left_hip",
            BodyJoint::RightHip => "right_hip",
            BodyJoint::LeftKnee => "left_knee",
            BodyJoint::RightKnee => "right_knee",
            BodyJoint::LeftAnkle => "left_ankle",
            BodyJoint::RightAnkle => "right_ankle",
        }
    }

    /// Index in the 33-point MediaPipe pose topology.
    pub fn pose_index(&self) -> usize {
        match self {
            BodyJoint::Nose => 0,
            BodyJoint::LeftShoulder => 11,
            BodyJoint::RightShoulder => 12,
            BodyJoint::LeftHip => 23,
            BodyJoint::RightHip => 24,
            BodyJoint::LeftKnee => 25,
            BodyJoint::RightKnee => 26,
            BodyJoint::LeftAnkle => 27,
            BodyJoint::RightAnkle => 28,
        }
    }
}

/// Named body landmarks for one detected person.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BodyLandmarks(pub HashMap<BodyJoint, LandmarkPoint>);

impl BodyLandmarks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pick the full-body joints out of a 33-point pose landmark list.
    pub fn from_pose_indices(points: &[LandmarkPoint]) -> Self {
        let map = BodyJoint::ALL
            .iter()
            .filter_map(|joint| points.get(joint.pose_index()).map(|p| (*joint, *p)))
            .collect();
        Self(map)
    }

    pub fn with(mut self, joint: BodyJoint, point: LandmarkPoint) -> Self {
        self.0.insert(joint, point);
        self
    }

    pub fn get(&self, joint: BodyJoint) -> Option<&LandmarkPoint> {
        self.0.get(&joint)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&BodyJoint, &LandmarkPoint)> {
        self.0.iter()
    }

    /// Check that every full-body joint is present and visible above
    /// `threshold`; the returned [`FullBody`] is the only input the
    /// proportion extractors accept.
    pub fn full_body(&self, threshold: f64) -> Result<FullBody, ScoringError> {
        let missing: Vec<BodyJoint> = BodyJoint::ALL
            .iter()
            .copied()
            .filter(|joint| {
                !self
                    .get(*joint)
                    .map(|p| p.is_visible(threshold))
                    .unwrap_or(false)
            })
            .collect();
        if !missing.is_empty() {
            return Err(ScoringError::BodyNotVisible { missing });
        }

        let at = |joint: BodyJoint| self.0[&joint].position();
        Ok(FullBody {
            nose: at(BodyJoint::Nose),
            left_shoulder: at(BodyJoint::LeftShoulder),
            right_shoulder: at(BodyJoint::RightShoulder),
            left_hip: at(BodyJoint::LeftHip),
            right_hip: at(BodyJoint::RightHip),
            left_knee: at(BodyJoint::LeftKnee),
            right_knee: at(BodyJoint::RightKnee),
            left_ankle: at(BodyJoint::LeftAnkle),
            right_ankle: at(BodyJoint::RightAnkle),
        })
    }
}

/// Positions of the nine full-body joints, all known to be visible.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FullBody {
    pub nose: Point,
    pub left_shoulder: Point,
    pub right_shoulder: Point,
    pub left_hip: Point,
    pub right_hip: Point,
    pub left_knee: Point,
    pub right_knee: Point,
    pub left_ankle: Point,
    pub right_ankle: Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaceFeature {
    Chin,
    LeftEyebrow,
    RightEyebrow,
    NoseBridge,
    NoseTip,
    LeftEye,
    RightEye,
    TopLip,
    BottomLip,
}

impl FaceFeature {
    pub fn as_str(&self) -> &'static str {
        match self {
            FaceFeature::Chin => "chin",
            FaceFeature::LeftEyebrow => "left_eyebrow",
            FaceFeature::RightEyebrow => "right_eyebrow",
            FaceFeature::NoseBridge => "nose_bridge",
            FaceFeature::NoseTip => "nose_tip",
            FaceFeature::LeftEye => "left_eye",
            FaceFeature::RightEye => "right_eye",
            FaceFeature::TopLip => "top_lip",
            FaceFeature::BottomLip => "bottom_lip",
        }
    }
}

impl fmt::Display for FaceFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Landmark groups of a single detected face.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FaceLandmarkSet(pub HashMap<FaceFeature, Vec<Point>>);

impl FaceLandmarkSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, feature: FaceFeature, points: Vec<Point>) -> Self {
        self.0.insert(feature, points);
        self
    }

    pub fn group(&self, feature: FaceFeature) -> Option<&[Point]> {
        self.0.get(&feature).map(Vec::as_slice)
    }

    pub fn point_count(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    pub fn points(&self) -> impl Iterator<Item = &Point> {
        self.0.values().flatten()
    }
}

/// Emotion class percentages from an external classifier, each in [0,100].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmotionProbabilities {
    pub happy: f64,
    pub neutral: f64,
    pub surprise: f64,
    pub sad: f64,
    pub angry: f64,
    pub disgust: f64,
    pub fear: f64,
}

impl EmotionProbabilities {
    pub fn values(&self) -> [f64; 7] {
        [
            self.happy,
            self.neutral,
            self.surprise,
            self.sad,
            self.angry,
            self.disgust,
            self.fear,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProportionRecord {
    pub waist_to_hip_ratio: f64,
    pub shoulder_to_waist_ratio: f64,
    pub shoulder_to_hip_ratio: f64,
    pub leg_to_height_ratio: f64,
    pub torso_to_leg_ratio: f64,
    pub shoulder_symmetry: f64,
    pub hip_symmetry: f64,
}

/// Body, emotion and symmetry scores; `-1` marks a score that could not be
/// computed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreTriple {
    pub body: f64,
    pub emotion: f64,
    pub symmetry: f64,
}

impl Default for ScoreTriple {
    fn default() -> Self {
        Self {
            body: FAILURE_SENTINEL,
            emotion: FAILURE_SENTINEL,
            symmetry: FAILURE_SENTINEL,
        }
    }
}

impl ScoreTriple {
    pub fn body_score(&self) -> Option<f64> {
        available(self.body)
    }

    pub fn emotion_score(&self) -> Option<f64> {
        available(self.emotion)
    }

    pub fn symmetry_score(&self) -> Option<f64> {
        available(self.symmetry)
    }
}

/// `None` for the failure sentinel (or anything else outside a valid range).
pub fn available(score: f64) -> Option<f64> {
    (score.is_finite() && score >= 0.0).then_some(score)
}

pub fn score_or_sentinel(result: &Result<f64, ScoringError>) -> f64 {
    result.as_ref().copied().unwrap_or(FAILURE_SENTINEL)
}

/// Result of one external detector call as seen by the scoring core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Detection<T> {
    Found(T),
    Missing,
    Failed(String),
}

/// One analysis: the detector output for each image plus the gender the
/// body model should use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub gender: Gender,
    #[serde(default)]
    pub body: Option<Detection<BodyLandmarks>>,
    /// Emotion classifier output for the expressive (smiling) face image.
    #[serde(default)]
    pub emotions: Option<Detection<Vec<EmotionProbabilities>>>,
    /// Face landmark detector output for the neutral face image.
    #[serde(default)]
    pub face_landmarks: Option<Detection<Vec<FaceLandmarkSet>>>,
}

impl AnalysisRequest {
    pub fn new(gender: Gender) -> Self {
        Self {
            gender,
            body: None,
            emotions: None,
            face_landmarks: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    Body,
    Emotion,
    Symmetry,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModalityOutcome {
    pub modality: Modality,
    pub score: f64,
    /// `scored`, `skipped`, or the failure status of a [`ScoringError`].
    pub status: String,
    pub message: Option<String>,
}

impl ModalityOutcome {
    pub fn from_result(modality: Modality, result: &Result<f64, ScoringError>) -> Self {
        match result {
            Ok(score) => Self {
                modality,
                score: *score,
                status: "scored".to_string(),
                message: None,
            },
            Err(e) => Self {
                modality,
                score: FAILURE_SENTINEL,
                status: e.status().to_string(),
                message: Some(e.to_string()),
            },
        }
    }

    pub fn skipped(modality: Modality) -> Self {
        Self {
            modality,
            score: FAILURE_SENTINEL,
            status: "skipped".to_string(),
            message: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub gender: Gender,
    pub scores: ScoreTriple,
    /// Emotion/symmetry blend, or `-1`.
    pub face: f64,
    /// Face/body blend, or `-1`.
    pub overall: f64,
    pub outcomes: Vec<ModalityOutcome>,
    pub proportions: Option<ProportionRecord>,
    pub symmetry: Option<SymmetryMeasurement>,
}

impl AnalysisReport {
    /// Messages of every modality that failed, in modality order.
    pub fn error_messages(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter_map(|o| o.message.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn visible_body() -> BodyLandmarks {
        BodyJoint::ALL
            .iter()
            .enumerate()
            .fold(BodyLandmarks::new(), |acc, (i, joint)| {
                acc.with(*joint, LandmarkPoint::new(0.5, i as f64 * 0.1, 0.9))
            })
    }

    #[test]
    fn gender_parsing_is_case_insensitive_and_strict() {
        assert_eq!("Male".parse::<Gender>().unwrap(), Gender::Male);
        assert_eq!(" female ".parse::<Gender>().unwrap(), Gender::Female);
        let err = "other".parse::<Gender>().unwrap_err();
        assert_eq!(err, ScoringError::InvalidGender("other".to_string()));
        assert!("".parse::<Gender>().is_err());
    }

    #[test]
    fn full_body_requires_every_joint_above_threshold() {
        let body = visible_body();
        assert!(body.full_body(0.5).is_ok());

        let body = visible_body()
            .with(BodyJoint::LeftKnee, LandmarkPoint::new(0.4, 0.8, 0.5))
            .with(BodyJoint::RightAnkle, LandmarkPoint::new(0.6, 1.0, 0.1));
        match body.full_body(0.5) {
            Err(ScoringError::BodyNotVisible { missing }) => {
                assert_eq!(missing, vec![BodyJoint::LeftKnee, BodyJoint::RightAnkle]);
            }
            other => panic!("expected BodyNotVisible, got {other:?}"),
        }
    }

    #[test]
    fn full_body_reports_absent_joints() {
        let mut body = visible_body();
        body.0.remove(&BodyJoint::Nose);
        let err = body.full_body(0.5).unwrap_err();
        assert_eq!(
            err,
            ScoringError::BodyNotVisible {
                missing: vec![BodyJoint::Nose]
            }
        );
    }

    #[test]
    fn pose_index_mapping_picks_full_body_joints() {
        let points: Vec<LandmarkPoint> = (0..33)
            .map(|i| LandmarkPoint::new(i as f64, 0.0, 1.0))
            .collect();
        let body = BodyLandmarks::from_pose_indices(&points);
        assert_eq!(body.len(), 9);
        assert_eq!(body.get(BodyJoint::LeftHip).unwrap().x, 23.0);
        assert_eq!(body.get(BodyJoint::RightAnkle).unwrap().x, 28.0);

        let short = BodyLandmarks::from_pose_indices(&points[..20]);
        assert_eq!(short.len(), 3);
    }

    #[test]
    fn body_landmarks_deserialize_from_named_map() {
        let json = serde_json::json!({
            "nose": {"x": 0.5, "y": 0.1, "visibility": 0.99},
            "left_shoulder": {"x": 0.4, "y": 0.3, "visibility": 0.9}
        });
        let body: BodyLandmarks = serde_json::from_value(json).unwrap();
        assert_eq!(body.len(), 2);
        assert_eq!(body.get(BodyJoint::Nose).unwrap().visibility, 0.99);
    }

    #[test]
    fn emotion_probabilities_default_missing_keys() {
        let probs: EmotionProbabilities =
            serde_json::from_value(serde_json::json!({"happy": 80.0})).unwrap();
        assert_eq!(probs.happy, 80.0);
        assert_eq!(probs.sad, 0.0);
    }

    #[test]
    fn score_triple_branches_on_sentinel() {
        let triple = ScoreTriple {
            body: 72.0,
            emotion: FAILURE_SENTINEL,
            symmetry: 50.0,
        };
        assert_eq!(triple.body_score(), Some(72.0));
        assert_eq!(triple.emotion_score(), None);
        assert_eq!(triple.symmetry_score(), Some(50.0));
        assert_eq!(ScoreTriple::default().body_score(), None);
    }

    #[test]
    fn detection_uses_status_tag() {
        let found: Detection<Vec<EmotionProbabilities>> = serde_json::from_value(
            serde_json::json!({"status": "found", "value": [{"happy": 10.0}]}),
        )
        .unwrap();
        assert!(matches!(found, Detection::Found(ref v) if v.len() == 1));

        let missing: Detection<BodyLandmarks> =
            serde_json::from_value(serde_json::json!({"status": "missing"})).unwrap();
        assert_eq!(missing, Detection::Missing);
    }
}
