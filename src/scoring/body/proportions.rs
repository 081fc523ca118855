//! Body proportion extraction from the nine full-body pose landmarks.

use crate::constants::{
    END_TO_END_WAIST_FRACTION, HEAD_TOP_OFFSET, TILT_SYMMETRY_GAIN, WAIST_FROM_HIP_FRACTION,
};
use crate::scoring::config::ProportionMethod;
use crate::scoring::geometry::{mean, midpoint, safe_ratio, Point};
use crate::scoring::types::{FullBody, ProportionRecord};

pub fn extract(body: &FullBody, method: ProportionMethod) -> ProportionRecord {
    match method {
        ProportionMethod::Anatomical => anatomical(body),
        ProportionMethod::EndToEnd => end_to_end(body),
    }
}

/// Widths as joint-to-joint distances, waist interpolated between each
/// shoulder and hip, leg length along the hip-knee-ankle chain.
pub fn anatomical(body: &FullBody) -> ProportionRecord {
    let shoulder_width = body.left_shoulder.distance(&body.right_shoulder);
    let hip_width = body.left_hip.distance(&body.right_hip);

    let left_waist = body.left_hip.toward(&body.left_shoulder, WAIST_FROM_HIP_FRACTION);
    let right_waist = body
        .right_hip
        .toward(&body.right_shoulder, WAIST_FROM_HIP_FRACTION);
    let waist_width = left_waist.distance(&right_waist);

    let shoulder_line = midpoint(&body.left_shoulder, &body.right_shoulder);
    let hip_line = midpoint(&body.left_hip, &body.right_hip);
    let torso_height = hip_line.y - shoulder_line.y;

    let leg_length = mean(&[
        leg(&body.left_hip, &body.left_knee, &body.left_ankle),
        leg(&body.right_hip, &body.right_knee, &body.right_ankle),
    ]);

    let head_top = body.nose.y - HEAD_TOP_OFFSET;
    let ankle_bottom = midpoint(&body.left_ankle, &body.right_ankle).y;
    let body_height = (ankle_bottom - head_top).abs();

    ProportionRecord {
        waist_to_hip_ratio: safe_ratio(waist_width, hip_width),
        shoulder_to_waist_ratio: safe_ratio(shoulder_width, waist_width),
        shoulder_to_hip_ratio: safe_ratio(shoulder_width, hip_width),
        leg_to_height_ratio: safe_ratio(leg_length, body_height),
        torso_to_leg_ratio: safe_ratio(torso_height, leg_length),
        shoulder_symmetry: tilt_symmetry(&body.left_shoulder, &body.right_shoulder),
        hip_symmetry: tilt_symmetry(&body.left_hip, &body.right_hip),
    }
}

/// Horizontal extents only; the waist is taken as wide as the hips and the
/// vertical split runs from the highest shoulder to the lowest ankle.
pub fn end_to_end(body: &FullBody) -> ProportionRecord {
    let shoulder_width = (body.left_shoulder.x - body.right_shoulder.x).abs();
    let hip_width = (body.left_hip.x - body.right_hip.x).abs();
    let waist_width = (body.right_hip.x - body.left_hip.x).abs();

    let mean_hip_y = midpoint(&body.left_hip, &body.right_hip).y;
    let mean_shoulder_y = midpoint(&body.left_shoulder, &body.right_shoulder).y;
    let waist_y = mean_hip_y - (mean_hip_y - mean_shoulder_y) * END_TO_END_WAIST_FRACTION;

    let shoulder_top = body.left_shoulder.y.min(body.right_shoulder.y);
    let ankle_bottom = body.left_ankle.y.max(body.right_ankle.y);

    let shoulder_to_waist = (waist_y - shoulder_top).abs();
    let waist_to_ankle = (ankle_bottom - waist_y).abs();
    let total_height = (ankle_bottom - shoulder_top).abs();

    ProportionRecord {
        waist_to_hip_ratio: safe_ratio(waist_width, hip_width),
        shoulder_to_waist_ratio: safe_ratio(shoulder_width, waist_width),
        shoulder_to_hip_ratio: safe_ratio(shoulder_width, hip_width),
        leg_to_height_ratio: safe_ratio(waist_to_ankle, total_height),
        torso_to_leg_ratio: safe_ratio(shoulder_to_waist, waist_to_ankle),
        shoulder_symmetry: tilt_symmetry(&body.left_shoulder, &body.right_shoulder),
        hip_symmetry: tilt_symmetry(&body.left_hip, &body.right_hip),
    }
}

fn leg(hip: &Point, knee: &Point, ankle: &Point) -> f64 {
    hip.distance(knee) + knee.distance(ankle)
}

/// 1 for a level pair; not clamped, so strong tilt goes negative.
fn tilt_symmetry(left: &Point, right: &Point) -> f64 {
    1.0 - (left.y - right.y).abs() * TILT_SYMMETRY_GAIN
}
