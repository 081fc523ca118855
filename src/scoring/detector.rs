//! Seam to the external pose, face-landmark and emotion models.
//!
//! The scoring core never looks at pixels. A caller that owns real models
//! implements these traits for its image type and lets [`DetectorPipeline`]
//! turn their output into an [`AnalysisRequest`].

use std::sync::Arc;

use thiserror::Error;

use crate::scoring::engine::{
    ScoringEngine, EMOTION_CLASSIFIER, FACE_LANDMARK_DETECTOR, POSE_DETECTOR,
};
use crate::scoring::types::{
    AnalysisReport, AnalysisRequest, BodyLandmarks, Detection, EmotionProbabilities,
    FaceLandmarkSet, Gender,
};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DetectorError {
    #[error("model unavailable: {0}")]
    Unavailable(String),
    #[error("unreadable image: {0}")]
    InvalidImage(String),
    #[error("inference failed: {0}")]
    Inference(String),
}

pub trait PoseDetector<I: ?Sized> {
    /// `Ok(None)` when no person is in the image.
    fn detect_pose(&self, image: &I) -> Result<Option<BodyLandmarks>, DetectorError>;
}

pub trait FaceLandmarkDetector<I: ?Sized> {
    fn face_landmarks(&self, image: &I) -> Result<Vec<FaceLandmarkSet>, DetectorError>;
}

pub trait EmotionClassifier<I: ?Sized> {
    fn classify(&self, image: &I) -> Result<Vec<EmotionProbabilities>, DetectorError>;
}

/// The three images of one analysis; any may be left out.
pub struct ImageSet<'a, I: ?Sized> {
    pub body: Option<&'a I>,
    /// Smiling face, fed to the emotion classifier.
    pub expressive_face: Option<&'a I>,
    /// Neutral face, fed to the face landmark detector.
    pub neutral_face: Option<&'a I>,
}

impl<'a, I: ?Sized> ImageSet<'a, I> {
    pub fn new() -> Self {
        Self {
            body: None,
            expressive_face: None,
            neutral_face: None,
        }
    }

    pub fn with_body(mut self, image: &'a I) -> Self {
        self.body = Some(image);
        self
    }

    pub fn with_expressive_face(mut self, image: &'a I) -> Self {
        self.expressive_face = Some(image);
        self
    }

    pub fn with_neutral_face(mut self, image: &'a I) -> Self {
        self.neutral_face = Some(image);
        self
    }
}

impl<'a, I: ?Sized> Default for ImageSet<'a, I> {
    fn default() -> Self {
        Self::new()
    }
}

pub struct DetectorPipeline<P, F, E> {
    engine: Arc<ScoringEngine>,
    pose: P,
    faces: F,
    emotions: E,
}

impl<P, F, E> DetectorPipeline<P, F, E> {
    pub fn new(engine: Arc<ScoringEngine>, pose: P, faces: F, emotions: E) -> Self {
        Self {
            engine,
            pose,
            faces,
            emotions,
        }
    }

    /// Run each detector once on its image (no retries) and score the result.
    pub fn run<I>(&self, gender: Gender, images: &ImageSet<'_, I>) -> AnalysisReport
    where
        I: ?Sized,
        P: PoseDetector<I>,
        F: FaceLandmarkDetector<I>,
        E: EmotionClassifier<I>,
    {
        let request = self.detect(gender, images);
        self.engine.analyze(&request)
    }

    pub fn detect<I>(&self, gender: Gender, images: &ImageSet<'_, I>) -> AnalysisRequest
    where
        I: ?Sized,
        P: PoseDetector<I>,
        F: FaceLandmarkDetector<I>,
        E: EmotionClassifier<I>,
    {
        let body = images.body.map(|image| {
            detection(POSE_DETECTOR, self.pose.detect_pose(image), |found| found)
        });
        let emotions = images.expressive_face.map(|image| {
            detection(EMOTION_CLASSIFIER, self.emotions.classify(image), non_empty)
        });
        let face_landmarks = images.neutral_face.map(|image| {
            detection(FACE_LANDMARK_DETECTOR, self.faces.face_landmarks(image), non_empty)
        });

        AnalysisRequest {
            gender,
            body,
            emotions,
            face_landmarks,
        }
    }
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    (!items.is_empty()).then_some(items)
}

fn detection<R, T>(
    detector: &str,
    result: Result<R, DetectorError>,
    present: impl FnOnce(R) -> Option<T>,
) -> Detection<T> {
    match result {
        Ok(raw) => match present(raw) {
            Some(value) => Detection::Found(value),
            None => Detection::Missing,
        },
        Err(e) => {
            tracing::error!(detector, error = %e, "Upstream detector error");
            Detection::Failed(e.to_string())
        }
    }
}
