//! Body score policies: proportion record + gender -> score.

use crate::scoring::config::{
    BodyModelConfig, BodyScorePolicy, DeviationBandConfig, LinearPenaltyConfig, RatioTargets,
};
use crate::scoring::jitter::Jitter;
use crate::scoring::types::{Gender, ProportionRecord};

pub fn score(
    record: &ProportionRecord,
    gender: Gender,
    config: &BodyModelConfig,
    jitter: &mut Jitter,
) -> f64 {
    match config.policy {
        BodyScorePolicy::DeviationBand => {
            deviation_band(record, gender, &config.deviation_band, jitter)
        }
        BodyScorePolicy::LinearPenalty => {
            linear_penalty(record, gender, &config.linear_penalty, jitter)
        }
        BodyScorePolicy::AggregateDeviation => {
            aggregate_deviation(record, gender, &config.deviation_band)
        }
    }
}

/// Shoulder/waist, waist/hip, leg/height, torso/leg.
fn scored_ratios(record: &ProportionRecord) -> [f64; 4] {
    [
        record.shoulder_to_waist_ratio,
        record.waist_to_hip_ratio,
        record.leg_to_height_ratio,
        record.torso_to_leg_ratio,
    ]
}

/// `|actual - ideal| / ideal`; infinite when either side is unusable.
pub fn relative_deviation(actual: f64, ideal: f64) -> f64 {
    let d = (actual - ideal).abs() / ideal;
    if d.is_finite() {
        d
    } else {
        f64::INFINITY
    }
}

/// Piecewise mapping of a relative deviation to a metric score in [50, 100].
pub fn band_score(deviation: f64) -> f64 {
    if deviation <= 0.05 {
        95.0 + (0.05 - deviation) * 100.0
    } else if deviation <= 0.15 {
        85.0 + (0.15 - deviation) * 100.0
    } else if deviation <= 0.25 {
        75.0 + (0.25 - deviation) * 50.0
    } else {
        (75.0 - (deviation - 0.25) * 100.0).max(50.0)
    }
}

/// Symmetry ratio as points, capped at 100 and kept finite.
fn symmetry_points(value: f64) -> f64 {
    if value.is_finite() {
        (value * 100.0).clamp(f64::MIN, 100.0)
    } else {
        0.0
    }
}

/// `clamp` that sends NaN to the lower bound.
fn bounded(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        min
    } else {
        value.clamp(min, max)
    }
}

pub fn deviation_band(
    record: &ProportionRecord,
    gender: Gender,
    config: &DeviationBandConfig,
    jitter: &mut Jitter,
) -> f64 {
    let ideals = config.ideals.for_gender(gender).as_array();
    let ratios = scored_ratios(record);

    let mut scores = [0.0; 6];
    for (slot, (actual, ideal)) in scores.iter_mut().zip(ratios.iter().zip(ideals.iter())) {
        *slot = band_score(relative_deviation(*actual, *ideal));
    }
    scores[4] = symmetry_points(record.shoulder_symmetry);
    scores[5] = symmetry_points(record.hip_symmetry);

    let weighted: f64 = scores
        .iter()
        .zip(config.weights.iter())
        .map(|(s, w)| s * w)
        .sum();

    bounded(
        weighted + jitter.sample(config.jitter_amplitude),
        config.min_score,
        config.max_score,
    )
}

fn penalty(actual: f64, ideal: f64, gain: f64, max_penalty: f64) -> f64 {
    let lost = (actual - ideal).abs() * gain;
    if lost.is_finite() {
        100.0 - lost.min(max_penalty)
    } else {
        100.0 - max_penalty
    }
}

pub fn linear_penalty(
    record: &ProportionRecord,
    gender: Gender,
    config: &LinearPenaltyConfig,
    jitter: &mut Jitter,
) -> f64 {
    let ideals: &RatioTargets = config.ideals.for_gender(gender);
    let ratios = scored_ratios(record);
    let gains = config.gains.as_array();

    let mut total = 0.0;
    for ((actual, ideal), gain) in ratios.iter().zip(ideals.as_array()).zip(gains) {
        total += penalty(*actual, ideal, gain, config.max_penalty);
    }
    total += symmetry_points(record.shoulder_symmetry);
    total += symmetry_points(record.hip_symmetry);

    let raw = (total / 6.0).max(0.0);
    let curved = config.curve_base + config.curve_span * (raw / 100.0).sqrt();

    bounded(
        curved + jitter.sample(config.jitter_amplitude),
        config.min_score,
        config.max_score,
    )
}

/// Sum of relative deviations over the four ratios, as a percentage in [0, 100].
pub fn aggregate_raw(record: &ProportionRecord, ideals: &RatioTargets) -> f64 {
    let total: f64 = scored_ratios(record)
        .iter()
        .zip(ideals.as_array())
        .map(|(actual, ideal)| relative_deviation(*actual, ideal))
        .sum();
    (100.0 * (1.0 - total)).clamp(0.0, 100.0)
}

/// `50 + 50 * tanh(raw / 50)`, clamped to [50, 100].
pub fn aggregate_scale(raw: f64) -> f64 {
    (50.0 + 50.0 * (raw / 50.0).tanh()).clamp(50.0, 100.0)
}

pub fn aggregate_deviation(
    record: &ProportionRecord,
    gender: Gender,
    config: &DeviationBandConfig,
) -> f64 {
    aggregate_scale(aggregate_raw(record, config.ideals.for_gender(gender)))
}
