use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_VISIBILITY_THRESHOLD;
use crate::scoring::jitter::JitterSettings;
use crate::scoring::types::Gender;
use crate::scoring::ScoringError;

/// How body proportions are measured from the pose landmarks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProportionMethod {
    #[default]
    Anatomical,
    EndToEnd,
}

/// Which curve turns a proportion record into a body score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyScorePolicy {
    #[default]
    DeviationBand,
    LinearPenalty,
    AggregateDeviation,
}

/// How each facial landmark is paired with its mirror image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MirrorMatching {
    /// Point `i` against reflected point `i`.
    #[default]
    IndexAligned,
    /// Point `i` against the closest reflected point.
    NearestNeighbor,
}

macro_rules! snake_case_enum_parse {
    ($ty:ty, { $($name:literal => $variant:expr),+ $(,)? }) => {
        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
                    $($name => Ok($variant),)+
                    other => Err(format!("unknown {}: {other}", stringify!($ty))),
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                $(if *self == $variant { return f.write_str($name); })+
                Ok(())
            }
        }
    };
}

snake_case_enum_parse!(ProportionMethod, {
    "anatomical" => ProportionMethod::Anatomical,
    "end_to_end" => ProportionMethod::EndToEnd,
});

snake_case_enum_parse!(BodyScorePolicy, {
    "deviation_band" => BodyScorePolicy::DeviationBand,
    "linear_penalty" => BodyScorePolicy::LinearPenalty,
    "aggregate_deviation" => BodyScorePolicy::AggregateDeviation,
});

snake_case_enum_parse!(MirrorMatching, {
    "index_aligned" => MirrorMatching::IndexAligned,
    "nearest_neighbor" => MirrorMatching::NearestNeighbor,
});

/// Target value for each of the four scored body ratios.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatioTargets {
    pub shoulder_to_waist: f64,
    pub waist_to_hip: f64,
    pub leg_to_height: f64,
    pub torso_to_leg: f64,
}

impl RatioTargets {
    pub fn as_array(&self) -> [f64; 4] {
        [
            self.shoulder_to_waist,
            self.waist_to_hip,
            self.leg_to_height,
            self.torso_to_leg,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenderTargets {
    pub male: RatioTargets,
    pub female: RatioTargets,
}

impl GenderTargets {
    pub fn for_gender(&self, gender: Gender) -> &RatioTargets {
        match gender {
            Gender::Male => &self.male,
            Gender::Female => &self.female,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviationBandConfig {
    pub ideals: GenderTargets,
    /// Order: shoulder/waist, waist/hip, leg/height, torso/leg, shoulder sym, hip sym.
    pub weights: [f64; 6],
    pub jitter_amplitude: f64,
    pub min_score: f64,
    pub max_score: f64,
}

impl Default for DeviationBandConfig {
    fn default() -> Self {
        Self {
            ideals: GenderTargets {
                male: RatioTargets {
                    shoulder_to_waist: 1.8,
                    waist_to_hip: 0.95,
                    leg_to_height: 0.525,
                    torso_to_leg: 0.75,
                },
                female: RatioTargets {
                    shoulder_to_waist: 1.4,
                    waist_to_hip: 0.75,
                    leg_to_height: 0.525,
                    torso_to_leg: 0.75,
                },
            },
            weights: [0.3, 0.3, 0.2, 0.1, 0.05, 0.05],
            jitter_amplitude: 1.0,
            min_score: 50.0,
            max_score: 100.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LinearPenaltyConfig {
    pub ideals: GenderTargets,
    /// Points lost per unit of absolute deviation, per ratio.
    pub gains: RatioTargets,
    pub max_penalty: f64,
    /// `base + span * sqrt(raw / 100)` reshaping of the averaged score.
    pub curve_base: f64,
    pub curve_span: f64,
    pub jitter_amplitude: f64,
    pub min_score: f64,
    pub max_score: f64,
}

impl Default for LinearPenaltyConfig {
    fn default() -> Self {
        Self {
            ideals: GenderTargets {
                male: RatioTargets {
                    shoulder_to_waist: 1.618,
                    waist_to_hip: 0.95,
                    leg_to_height: 0.525,
                    torso_to_leg: 0.75,
                },
                female: RatioTargets {
                    shoulder_to_waist: 1.4,
                    waist_to_hip: 0.75,
                    leg_to_height: 0.525,
                    torso_to_leg: 0.75,
                },
            },
            gains: RatioTargets {
                shoulder_to_waist: 60.0,
                waist_to_hip: 120.0,
                leg_to_height: 300.0,
                torso_to_leg: 80.0,
            },
            max_penalty: 70.0,
            curve_base: 60.0,
            curve_span: 40.0,
            jitter_amplitude: 5.0,
            min_score: 60.0,
            max_score: 100.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BodyModelConfig {
    pub policy: BodyScorePolicy,
    pub proportion_method: ProportionMethod,
    pub visibility_threshold: f64,
    pub deviation_band: DeviationBandConfig,
    pub linear_penalty: LinearPenaltyConfig,
}

impl Default for BodyModelConfig {
    fn default() -> Self {
        Self {
            policy: BodyScorePolicy::default(),
            proportion_method: ProportionMethod::default(),
            visibility_threshold: DEFAULT_VISIBILITY_THRESHOLD,
            deviation_band: DeviationBandConfig::default(),
            linear_penalty: LinearPenaltyConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SymmetryConfig {
    pub matching: MirrorMatching,
    /// Normalized error at (or below) which the score is `max_score`.
    pub min_error: f64,
    /// Normalized error at (or above) which the score is `min_score`.
    pub max_error: f64,
    pub min_score: f64,
    pub max_score: f64,
}

impl Default for SymmetryConfig {
    fn default() -> Self {
        Self {
            matching: MirrorMatching::default(),
            min_error: 0.26,
            max_error: 0.36,
            min_score: 50.0,
            max_score: 100.0,
        }
    }
}

/// Linear weights applied to the emotion percentages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmotionWeights {
    pub happy: f64,
    pub neutral: f64,
    pub surprise: f64,
    pub sad: f64,
    pub angry: f64,
    pub disgust: f64,
    pub fear: f64,
}

impl Default for EmotionWeights {
    fn default() -> Self {
        Self {
            happy: 1.0,
            neutral: 0.5,
            surprise: 0.3,
            sad: -1.0,
            angry: -1.0,
            disgust: -1.0,
            fear: -1.0,
        }
    }
}

impl EmotionWeights {
    /// Earlier proxy: `happy + 0.5 * neutral - sad`.
    pub fn simple_proxy() -> Self {
        Self {
            happy: 1.0,
            neutral: 0.5,
            surprise: 0.0,
            sad: -1.0,
            angry: 0.0,
            disgust: 0.0,
            fear: 0.0,
        }
    }

    pub fn as_array(&self) -> [f64; 7] {
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

/// `emotion_weight * emotion + symmetry_weight * (symmetry + symmetry_offset)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FaceBlend {
    pub emotion_weight: f64,
    pub symmetry_weight: f64,
    pub symmetry_offset: f64,
}

impl Default for FaceBlend {
    fn default() -> Self {
        Self::emotion_led()
    }
}

impl FaceBlend {
    pub fn emotion_led() -> Self {
        Self {
            emotion_weight: 0.85,
            symmetry_weight: 0.15,
            symmetry_offset: 20.0,
        }
    }

    pub fn symmetry_only() -> Self {
        Self {
            emotion_weight: 0.0,
            symmetry_weight: 1.0,
            symmetry_offset: 0.0,
        }
    }

    pub fn preset(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "emotion_led" => Some(Self::emotion_led()),
            "symmetry_only" => Some(Self::symmetry_only()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OverallBlend {
    pub face_weight: f64,
    pub body_weight: f64,
}

impl Default for OverallBlend {
    fn default() -> Self {
        Self {
            face_weight: 0.5,
            body_weight: 0.5,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringConfig {
    #[serde(default)]
    pub body: BodyModelConfig,
    #[serde(default)]
    pub symmetry: SymmetryConfig,
    #[serde(default)]
    pub emotion: EmotionWeights,
    #[serde(default)]
    pub face_blend: FaceBlend,
    #[serde(default)]
    pub overall_blend: OverallBlend,
    #[serde(default)]
    pub jitter: JitterSettings,
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.body.visibility_threshold) {
            return Err("body.visibility_threshold must be in [0,1]".to_string());
        }

        for (label, targets) in [
            ("deviation_band.ideals.male", &self.body.deviation_band.ideals.male),
            ("deviation_band.ideals.female", &self.body.deviation_band.ideals.female),
            ("linear_penalty.ideals.male", &self.body.linear_penalty.ideals.male),
            ("linear_penalty.ideals.female", &self.body.linear_penalty.ideals.female),
        ] {
            if targets.as_array().iter().any(|v| !(v.is_finite() && *v > 0.0)) {
                return Err(format!("body.{label} must all be > 0"));
            }
        }

        let band = &self.body.deviation_band;
        if band.weights.iter().any(|w| !(w.is_finite() && *w >= 0.0)) {
            return Err("body.deviation_band.weights must be >= 0".to_string());
        }
        let weight_sum: f64 = band.weights.iter().sum();
        if (weight_sum - 1.0).abs() > 0.01 {
            return Err(format!(
                "body.deviation_band.weights should sum to ~1.0 (got {weight_sum:.3})"
            ));
        }
        check_range("body.deviation_band", band.min_score, band.max_score)?;
        if !(band.jitter_amplitude >= 0.0) {
            return Err("body.deviation_band.jitter_amplitude must be >= 0".to_string());
        }

        let linear = &self.body.linear_penalty;
        if linear.gains.as_array().iter().any(|g| !(g.is_finite() && *g >= 0.0)) {
            return Err("body.linear_penalty.gains must be >= 0".to_string());
        }
        if !(linear.max_penalty >= 0.0 && linear.max_penalty <= 100.0) {
            return Err("body.linear_penalty.max_penalty must be in [0,100]".to_string());
        }
        if !(linear.jitter_amplitude >= 0.0) {
            return Err("body.linear_penalty.jitter_amplitude must be >= 0".to_string());
        }
        check_range("body.linear_penalty", linear.min_score, linear.max_score)?;

        let sym = &self.symmetry;
        if !(sym.min_error.is_finite() && sym.max_error.is_finite() && sym.min_error < sym.max_error)
        {
            return Err("symmetry.min_error must be < symmetry.max_error".to_string());
        }
        check_range("symmetry", sym.min_score, sym.max_score)?;

        if self.emotion.as_array().iter().any(|w| !w.is_finite()) {
            return Err("emotion weights must be finite".to_string());
        }

        let face = &self.face_blend;
        if !(face.emotion_weight >= 0.0 && face.symmetry_weight >= 0.0)
            || !face.symmetry_offset.is_finite()
        {
            return Err("face_blend weights must be >= 0".to_string());
        }
        if face.emotion_weight + face.symmetry_weight <= 0.0 {
            return Err("face_blend weights must not both be 0".to_string());
        }

        let overall = &self.overall_blend;
        if !(overall.face_weight >= 0.0 && overall.body_weight >= 0.0) {
            return Err("overall_blend weights must be >= 0".to_string());
        }
        if overall.face_weight + overall.body_weight <= 0.0 {
            return Err("overall_blend weights must not both be 0".to_string());
        }

        Ok(())
    }

    pub fn from_env(env_config: &crate::config::ScoringEnvConfig) -> Result<Self, ScoringError> {
        let mut config = match env_config.config_path.as_deref() {
            Some(path) if !path.trim().is_empty() => Self::from_file(path)?,
            _ => Self::default(),
        };
        if let Some(policy) = env_config.body_policy {
            config.body.policy = policy;
        }
        if let Some(method) = env_config.proportion_method {
            config.body.proportion_method = method;
        }
        if let Some(matching) = env_config.mirror_matching {
            config.symmetry.matching = matching;
        }
        if let Some(blend) = env_config.face_blend {
            config.face_blend = blend;
        }
        if let Some(enabled) = env_config.jitter_enabled {
            config.jitter.enabled = enabled;
        }
        if env_config.jitter_seed.is_some() {
            config.jitter.seed = env_config.jitter_seed;
        }
        config.validate().map_err(ScoringError::InvalidConfig)?;
        Ok(config)
    }

    pub fn from_file(path: &str) -> Result<Self, ScoringError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ScoringError::InvalidConfig(format!("cannot read {path}: {e}")))?;
        let config: Self = serde_json::from_str(&raw)
            .map_err(|e| ScoringError::InvalidConfig(format!("cannot parse {path}: {e}")))?;
        tracing::info!(path, "Loaded scoring config file");
        Ok(config)
    }
}

fn check_range(label: &str, min: f64, max: f64) -> Result<(), String> {
    if !(min.is_finite() && max.is_finite() && 0.0 <= min && min <= max && max <= 100.0) {
        return Err(format!("{label} score range must satisfy 0 <= min <= max <= 100"));
    }
    Ok(())
}
