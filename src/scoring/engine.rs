use std::sync::{Arc, RwLock};

use crate::scoring::body::{self, BodyAssessment};
use crate::scoring::composite::{CompositeScore, CompositeScorer};
use crate::scoring::config::{FaceBlend, OverallBlend, ScoringConfig};
use crate::scoring::emotion;
use crate::scoring::jitter::Jitter;
use crate::scoring::metrics::{track_scorer, MetricsRegistry, ScorerId};
use crate::scoring::symmetry::{self, SymmetryMeasurement};
use crate::scoring::types::{
    AnalysisReport, AnalysisRequest, BodyLandmarks, Detection, EmotionProbabilities,
    FaceLandmarkSet, Gender, Modality, ModalityOutcome, ScoreTriple,
    score_or_sentinel,
};
use crate::scoring::{ScoringError, FAILURE_SENTINEL};

pub const POSE_DETECTOR: &str = "pose detector";
pub const FACE_LANDMARK_DETECTOR: &str = "face landmark detector";
pub const EMOTION_CLASSIFIER: &str = "emotion classifier";

/// Entry point of the scoring core. Every operation reads the configuration
/// once, so a concurrent reload never mixes two configurations in one result.
pub struct ScoringEngine {
    config: Arc<RwLock<ScoringConfig>>,
    metrics_registry: Arc<MetricsRegistry>,
}

impl ScoringEngine {
    pub fn new(config: ScoringConfig) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
            metrics_registry: Arc::new(MetricsRegistry::new()),
        }
    }

    pub fn reload_config(&self, new_config: ScoringConfig) -> Result<(), String> {
        new_config.validate()?;
        let mut cfg = self
            .config
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *cfg = new_config;
        tracing::info!("Scoring config reloaded");
        Ok(())
    }

    pub fn get_config(&self) -> ScoringConfig {
        self.config
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn metrics_registry(&self) -> &Arc<MetricsRegistry> {
        &self.metrics_registry
    }

    pub fn score_body(
        &self,
        landmarks: &BodyLandmarks,
        gender: Gender,
    ) -> Result<BodyAssessment, ScoringError> {
        let config = self.get_config();
        self.body_with(&config, landmarks, gender)
    }

    pub fn score_symmetry(
        &self,
        faces: &[FaceLandmarkSet],
    ) -> Result<SymmetryMeasurement, ScoringError> {
        let config = self.get_config();
        self.symmetry_with(&config, faces)
    }

    pub fn score_emotion(&self, faces: &[EmotionProbabilities]) -> Result<f64, ScoringError> {
        let config = self.get_config();
        self.emotion_with(&config, faces)
    }

    pub fn combine(&self, scores: &ScoreTriple) -> CompositeScore {
        self.combine_with(scores, None, None)
    }

    /// Combine with optional per-call blend overrides.
    pub fn combine_with(
        &self,
        scores: &ScoreTriple,
        face_blend: Option<FaceBlend>,
        overall_blend: Option<OverallBlend>,
    ) -> CompositeScore {
        let config = self.get_config();
        let scorer = CompositeScorer::new(
            face_blend.unwrap_or(config.face_blend),
            overall_blend.unwrap_or(config.overall_blend),
        );
        self.composite_with(&scorer, scores)
    }

    pub fn analyze(&self, request: &AnalysisRequest) -> AnalysisReport {
        let start = std::time::Instant::now();
        let config = self.get_config();
        let gender = request.gender;

        let (body_result, proportions) = match &request.body {
            None => (None, None),
            Some(detection) => {
                let result = found(detection, POSE_DETECTOR, ScoringError::NoPersonDetected)
                    .and_then(|landmarks| self.body_with(&config, landmarks, gender));
                let proportions = result.as_ref().ok().map(|a| a.proportions);
                (Some(result.map(|a| a.score)), proportions)
            }
        };

        let emotion_result = request.emotions.as_ref().map(|detection| {
            found(detection, EMOTION_CLASSIFIER, ScoringError::NoEmotionResult)
                .and_then(|faces| self.emotion_with(&config, faces))
        });

        let (symmetry_result, measurement) = match &request.face_landmarks {
            None => (None, None),
            Some(detection) => {
                let result = found(detection, FACE_LANDMARK_DETECTOR, ScoringError::NoFaceDetected)
                    .and_then(|faces| self.symmetry_with(&config, faces));
                let score = result.as_ref().map(|m| m.score).map_err(|e| e.clone());
                (Some(score), result.ok())
            }
        };

        let scores = ScoreTriple {
            body: sentinel_if_absent(&body_result),
            emotion: sentinel_if_absent(&emotion_result),
            symmetry: sentinel_if_absent(&symmetry_result),
        };
        let scorer = CompositeScorer::new(config.face_blend, config.overall_blend);
        let composite = self.composite_with(&scorer, &scores);

        let outcomes = vec![
            outcome(Modality::Body, &body_result),
            outcome(Modality::Emotion, &emotion_result),
            outcome(Modality::Symmetry, &symmetry_result),
        ];

        let latency_us = start.elapsed().as_micros() as u64;
        let failed = outcomes.iter().any(|o| o.message.is_some());
        self.metrics_registry
            .record_call(ScorerId::Analyze, latency_us, failed);

        tracing::info!(
            gender = gender.as_str(),
            body = scores.body,
            emotion = scores.emotion,
            symmetry = scores.symmetry,
            face = composite.face,
            overall = composite.overall,
            latency_us,
            "Analysis complete"
        );

        AnalysisReport {
            gender,
            scores,
            face: composite.face,
            overall: composite.overall,
            outcomes,
            proportions,
            symmetry: measurement,
        }
    }

    fn body_with(
        &self,
        config: &ScoringConfig,
        landmarks: &BodyLandmarks,
        gender: Gender,
    ) -> Result<BodyAssessment, ScoringError> {
        let mut jitter = Jitter::from_settings(&config.jitter);
        let result = track_scorer!(
            self.metrics_registry,
            ScorerId::Body,
            body::assess(landmarks, gender, &config.body, &mut jitter)
        );
        log_failure(Modality::Body, &result);
        result
    }

    fn symmetry_with(
        &self,
        config: &ScoringConfig,
        faces: &[FaceLandmarkSet],
    ) -> Result<SymmetryMeasurement, ScoringError> {
        let result = track_scorer!(
            self.metrics_registry,
            ScorerId::Symmetry,
            symmetry::measure(faces, &config.symmetry)
        );
        log_failure(Modality::Symmetry, &result);
        result
    }

    fn emotion_with(
        &self,
        config: &ScoringConfig,
        faces: &[EmotionProbabilities],
    ) -> Result<f64, ScoringError> {
        let result = track_scorer!(
            self.metrics_registry,
            ScorerId::Emotion,
            emotion::score_first(faces, &config.emotion)
        );
        log_failure(Modality::Emotion, &result);
        result
    }

    fn composite_with(&self, scorer: &CompositeScorer, scores: &ScoreTriple) -> CompositeScore {
        let start = std::time::Instant::now();
        let composite = scorer.combine(scores);
        self.metrics_registry.record_call(
            ScorerId::Composite,
            start.elapsed().as_micros() as u64,
            composite.overall == FAILURE_SENTINEL,
        );
        composite
    }
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::new(ScoringConfig::default())
    }
}

/// Unwrap a detector outcome, turning a miss into `missing` and an upstream
/// failure into [`ScoringError::UpstreamFailure`].
fn found<'a, T>(
    detection: &'a Detection<T>,
    detector: &str,
    missing: ScoringError,
) -> Result<&'a T, ScoringError> {
    match detection {
        Detection::Found(value) => Ok(value),
        Detection::Missing => {
            tracing::warn!(detector, error = %missing, "Detector found nothing");
            Err(missing)
        }
        Detection::Failed(message) => {
            tracing::warn!(detector, error = %message, "Detector call failed");
            Err(ScoringError::UpstreamFailure {
                detector: detector.to_string(),
                message: message.clone(),
            })
        }
    }
}

fn log_failure<T>(modality: Modality, result: &Result<T, ScoringError>) {
    if let Err(e) = result {
        tracing::warn!(
            modality = ?modality,
            status = e.status(),
            error = %e,
            "Scoring modality failed"
        );
    }
}

fn sentinel_if_absent(result: &Option<Result<f64, ScoringError>>) -> f64 {
    result.as_ref().map_or(FAILURE_SENTINEL, score_or_sentinel)
}

fn outcome(modality: Modality, result: &Option<Result<f64, ScoringError>>) -> ModalityOutcome {
    match result {
        Some(r) => ModalityOutcome::from_result(modality, r),
        None => ModalityOutcome::skipped(modality),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::geometry::Point;
    use crate::scoring::jitter::JitterSettings;
    use crate::scoring::types::{BodyJoint, FaceFeature, LandmarkPoint};

    fn quiet_engine() -> ScoringEngine {
        ScoringEngine::new(ScoringConfig {
            jitter: JitterSettings {
                enabled: false,
                seed: None,
            },
            ..ScoringConfig::default()
        })
    }

    fn standing_person() -> BodyLandmarks {
        let at = |x, y| LandmarkPoint::new(x, y, 0.99);
        BodyLandmarks::new()
            .with(BodyJoint::Nose, at(0.5, 0.15))
            .with(BodyJoint::LeftShoulder, at(0.35, 0.3))
            .with(BodyJoint::RightShoulder, at(0.65, 0.3))
            .with(BodyJoint::LeftHip, at(0.4, 0.6))
            .with(BodyJoint::RightHip, at(0.6, 0.6))
            .with(BodyJoint::LeftKnee, at(0.4, 0.8))
            .with(BodyJoint::RightKnee, at(0.6, 0.8))
            .with(BodyJoint::LeftAnkle, at(0.4, 1.0))
            .with(BodyJoint::RightAnkle, at(0.6, 1.0))
    }

    fn face() -> FaceLandmarkSet {
        FaceLandmarkSet::new()
            .with(FaceFeature::LeftEye, vec![Point::new(30.0, 40.0), Point::new(40.0, 38.0)])
            .with(FaceFeature::RightEye, vec![Point::new(60.0, 38.0), Point::new(70.0, 40.0)])
            .with(FaceFeature::NoseBridge, vec![Point::new(50.0, 45.0), Point::new(50.0, 55.0)])
            .with(FaceFeature::TopLip, vec![Point::new(40.0, 75.0), Point::new(60.0, 75.0)])
            .with(FaceFeature::BottomLip, vec![Point::new(42.0, 82.0), Point::new(58.0, 82.0)])
    }

    #[test]
    fn full_analysis_fills_every_score() {
        let engine = quiet_engine();
        let request = AnalysisRequest {
            body: Some(Detection::Found(standing_person())),
            emotions: Some(Detection::Found(vec![EmotionProbabilities {
                happy: 90.0,
                ..Default::default()
            }])),
            face_landmarks: Some(Detection::Found(vec![face()])),
            ..AnalysisRequest::new(Gender::Female)
        };
        let report = engine.analyze(&request);

        assert!((50.0..=100.0).contains(&report.scores.body));
        assert_eq!(report.scores.emotion, 90.0);
        assert!((50.0..=100.0).contains(&report.scores.symmetry));
        assert!((0.0..=100.0).contains(&report.face));
        assert!((0.0..=100.0).contains(&report.overall));
        assert!(report.proportions.is_some());
        assert!(report.symmetry.is_some());
        assert!(report.error_messages().is_empty());
    }

    #[test]
    fn misses_become_sentinels_with_status() {
        let engine = quiet_engine();
        let request = AnalysisRequest {
            body: Some(Detection::Missing),
            emotions: Some(Detection::Failed("model not loaded".to_string())),
            face_landmarks: Some(Detection::Found(vec![])),
            ..AnalysisRequest::new(Gender::Male)
        };
        let report = engine.analyze(&request);

        assert_eq!(report.scores, ScoreTriple::default());
        assert_eq!(report.face, FAILURE_SENTINEL);
        assert_eq!(report.overall, FAILURE_SENTINEL);
        let statuses: Vec<&str> = report.outcomes.iter().map(|o| o.status.as_str()).collect();
        assert_eq!(statuses, ["not_detected", "failed", "not_detected"]);
        assert_eq!(
            report.outcomes[1].message.as_deref(),
            Some("emotion classifier failed: model not loaded")
        );
    }

    #[test]
    fn absent_modalities_are_skipped() {
        let engine = quiet_engine();
        let report = engine.analyze(&AnalysisRequest::new(Gender::Male));
        assert!(report.outcomes.iter().all(|o| o.status == "skipped"));
        assert!(report.error_messages().is_empty());
    }

    #[test]
    fn seeded_jitter_repeats() {
        let engine = ScoringEngine::new(ScoringConfig {
            jitter: JitterSettings {
                enabled: true,
                seed: Some(99),
            },
            ..ScoringConfig::default()
        });
        let a = engine.score_body(&standing_person(), Gender::Male).unwrap();
        let b = engine.score_body(&standing_person(), Gender::Male).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn reload_validates_first() {
        let engine = quiet_engine();
        let mut bad = ScoringConfig::default();
        bad.symmetry.max_error = 0.1;
        assert!(engine.reload_config(bad).is_err());
        assert_eq!(engine.get_config().symmetry.max_error, 0.36);

        let mut good = ScoringConfig::default();
        good.face_blend = FaceBlend::symmetry_only();
        engine.reload_config(good).unwrap();
        assert_eq!(engine.get_config().face_blend, FaceBlend::symmetry_only());
    }

    #[test]
    fn metrics_track_each_modality() {
        let engine = quiet_engine();
        engine.score_emotion(&[]).unwrap_err();
        engine.score_symmetry(&[face()]).unwrap();
        let snap = engine.metrics_registry().snapshot();
        assert_eq!(snap["emotion"].failure_count, 1);
        assert_eq!(snap["symmetry"].call_count, 1);
        assert_eq!(snap["symmetry"].failure_count, 0);
    }
}
