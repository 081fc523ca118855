use proptest::prelude::*;

use allure_backend::scoring::body::policy;
use allure_backend::scoring::composite::CompositeScorer;
use allure_backend::scoring::config::{
    BodyModelConfig, BodyScorePolicy, FaceBlend, MirrorMatching, OverallBlend, SymmetryConfig,
};
use allure_backend::scoring::geometry::Point;
use allure_backend::scoring::jitter::Jitter;
use allure_backend::scoring::symmetry;
use allure_backend::scoring::types::{FaceFeature, FaceLandmarkSet, Gender, ProportionRecord, ScoreTriple};

/// Plausible values most of the time, with negative and near-overflow
/// magnitudes mixed in.
fn ratio(typical: f64) -> impl Strategy<Value = f64> {
    prop_oneof![
        6 => 0.0..typical,
        1 => -typical..0.0,
        1 => prop_oneof![Just(1e308), Just(-1e308), Just(f64::MAX), Just(f64::MIN)],
        1 => -1e300_f64..1e300,
    ]
}

fn record_strategy() -> impl Strategy<Value = ProportionRecord> {
    (
        ratio(5.0),
        ratio(5.0),
        ratio(5.0),
        ratio(2.0),
        ratio(5.0),
        ratio(1.5),
        ratio(1.5),
    )
        .prop_map(|(wh, sw, sh, lh, tl, ss, hs)| ProportionRecord {
            waist_to_hip_ratio: wh,
            shoulder_to_waist_ratio: sw,
            shoulder_to_hip_ratio: sh,
            leg_to_height_ratio: lh,
            torso_to_leg_ratio: tl,
            shoulder_symmetry: ss,
            hip_symmetry: hs,
        })
}

fn component() -> impl Strategy<Value = f64> {
    prop_oneof![Just(-1.0), 0.0_f64..=100.0]
}

/// A face mirrored about `mid`: paired eyes, centred nose and lips.
fn mirrored_face(mid: f64, eye_dx: f64, lip_dx: f64) -> FaceLandmarkSet {
    FaceLandmarkSet::new()
        .with(FaceFeature::LeftEye, vec![Point::new(mid - eye_dx, 40.0)])
        .with(FaceFeature::RightEye, vec![Point::new(mid + eye_dx, 40.0)])
        .with(FaceFeature::NoseBridge, vec![Point::new(mid, 50.0)])
        .with(
            FaceFeature::TopLip,
            vec![Point::new(mid - lip_dx, 75.0), Point::new(mid + lip_dx, 75.0)],
        )
        .with(FaceFeature::BottomLip, vec![Point::new(mid, 82.0)])
}

/// Every keypoint on the vertical line `x = mid`; the bottom lip sits at
/// least one unit below the left eye so the box has height.
fn midline_face(mid: f64, ys: &[f64; 5]) -> FaceLandmarkSet {
    FaceLandmarkSet::new()
        .with(FaceFeature::LeftEye, vec![Point::new(mid, ys[0])])
        .with(FaceFeature::RightEye, vec![Point::new(mid, ys[1])])
        .with(FaceFeature::NoseBridge, vec![Point::new(mid, ys[2])])
        .with(FaceFeature::TopLip, vec![Point::new(mid, ys[3])])
        .with(FaceFeature::BottomLip, vec![Point::new(mid, ys[0] + 1.0 + ys[4])])
}

fn shifted(face: &FaceLandmarkSet, dx: f64, dy: f64) -> FaceLandmarkSet {
    FaceLandmarkSet(
        face.0
            .iter()
            .map(|(feature, points)| {
                let moved = points.iter().map(|p| Point::new(p.x + dx, p.y + dy)).collect();
                (*feature, moved)
            })
            .collect(),
    )
}

proptest! {
    #[test]
    fn pt_band_score_is_bounded_and_non_increasing(a in 0.0_f64..10.0, b in 0.0_f64..10.0) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let s_lo = policy::band_score(lo);
        let s_hi = policy::band_score(hi);
        prop_assert!((50.0..=100.0).contains(&s_lo));
        prop_assert!((50.0..=100.0).contains(&s_hi));
        prop_assert!(s_hi <= s_lo + 1e-9);
    }

    #[test]
    fn pt_every_body_policy_stays_in_its_range(
        record in record_strategy(),
        female in any::<bool>(),
        which in 0_usize..3,
    ) {
        let gender = if female { Gender::Female } else { Gender::Male };
        let policy_kind = [
            BodyScorePolicy::DeviationBand,
            BodyScorePolicy::LinearPenalty,
            BodyScorePolicy::AggregateDeviation,
        ][which];
        let config = BodyModelConfig { policy: policy_kind, ..BodyModelConfig::default() };
        let mut jitter = Jitter::Thread;

        let score = policy::score(&record, gender, &config, &mut jitter);
        let (min, max) = match policy_kind {
            BodyScorePolicy::DeviationBand => {
                (config.deviation_band.min_score, config.deviation_band.max_score)
            }
            BodyScorePolicy::LinearPenalty => {
                (config.linear_penalty.min_score, config.linear_penalty.max_score)
            }
            BodyScorePolicy::AggregateDeviation => (50.0, 100.0),
        };
        prop_assert!(score >= min && score <= max, "score {} outside [{}, {}]", score, min, max);
    }

    #[test]
    fn pt_seeded_jitter_is_reproducible(record in record_strategy(), seed in any::<u64>()) {
        let config = BodyModelConfig::default();
        let a = policy::score(&record, Gender::Male, &config, &mut Jitter::seeded(seed));
        let b = policy::score(&record, Gender::Male, &config, &mut Jitter::seeded(seed));
        prop_assert_eq!(a, b);
    }

    #[test]
    fn pt_symmetric_face_scores_full_marks_with_nearest_neighbor(
        mid in -200.0_f64..200.0,
        eye_dx in 1.0_f64..50.0,
        lip_dx in 1.0_f64..50.0,
    ) {
        let config = SymmetryConfig {
            matching: MirrorMatching::NearestNeighbor,
            ..SymmetryConfig::default()
        };
        let m = symmetry::measure_face(&mirrored_face(mid, eye_dx, lip_dx), &config)
            .expect("symmetric face measures");
        prop_assert!(m.normalized_error < 1e-9);
        prop_assert_eq!(m.score, config.max_score);
    }

    #[test]
    fn pt_midline_face_scores_full_marks_with_index_alignment(
        mid in -200.0_f64..200.0,
        ys in prop::array::uniform5(0.0_f64..100.0),
    ) {
        let config = SymmetryConfig::default();
        prop_assert_eq!(config.matching, MirrorMatching::IndexAligned);
        let m = symmetry::measure_face(&midline_face(mid, &ys), &config)
            .expect("midline face measures");
        prop_assert!(m.normalized_error < 1e-9);
        prop_assert_eq!(m.score, config.max_score);
    }

    #[test]
    fn pt_symmetry_curve_is_bounded_and_non_increasing(a in -1.0_f64..3.0, b in -1.0_f64..3.0) {
        let config = SymmetryConfig::default();
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let s_lo = symmetry::linear_score(lo, &config);
        let s_hi = symmetry::linear_score(hi, &config);
        prop_assert!((config.min_score..=config.max_score).contains(&s_lo));
        prop_assert!((config.min_score..=config.max_score).contains(&s_hi));
        prop_assert!(s_hi <= s_lo + 1e-9);
    }

    #[test]
    fn pt_symmetry_is_translation_invariant(
        eye_dx in 1.0_f64..50.0,
        lip_dx in 1.0_f64..50.0,
        dx in -500.0_f64..500.0,
        dy in -500.0_f64..500.0,
        nearest in any::<bool>(),
    ) {
        let config = SymmetryConfig {
            matching: if nearest { MirrorMatching::NearestNeighbor } else { MirrorMatching::IndexAligned },
            ..SymmetryConfig::default()
        };
        let face = mirrored_face(60.0, eye_dx, lip_dx);
        let base = symmetry::measure_face(&face, &config).expect("base face");
        let moved = symmetry::measure_face(&shifted(&face, dx, dy), &config).expect("moved face");
        prop_assert!((base.normalized_error - moved.normalized_error).abs() < 1e-6);
        prop_assert!((config.min_score..=config.max_score).contains(&moved.score));
    }

    #[test]
    fn pt_composite_is_bounded_or_sentinel(
        body in component(),
        emotion in component(),
        symmetry_score in component(),
        symmetry_only in any::<bool>(),
    ) {
        let blend = if symmetry_only { FaceBlend::symmetry_only() } else { FaceBlend::default() };
        let scorer = CompositeScorer::new(blend, OverallBlend::default());
        let c = scorer.combine(&ScoreTriple { body, emotion, symmetry: symmetry_score });

        for value in [c.face, c.overall] {
            prop_assert!(value == -1.0 || (0.0..=100.0).contains(&value));
        }
        if body >= 0.0 {
            prop_assert!(c.overall >= 0.0);
        }
    }
}
