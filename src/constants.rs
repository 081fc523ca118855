/// A pose joint counts as visible only when its visibility exceeds this value.
pub const DEFAULT_VISIBILITY_THRESHOLD: f64 = 0.5;

/// Waist sits this fraction of the way from each hip toward its shoulder.
pub const WAIST_FROM_HIP_FRACTION: f64 = 0.6;

/// End-to-end method: waist line this fraction of the way from mean hip
/// height toward mean shoulder height.
pub const END_TO_END_WAIST_FRACTION: f64 = 0.4;

/// Offset from the nose to the top of the head, in normalized image units.
pub const HEAD_TOP_OFFSET: f64 = 0.15;

/// Shoulder/hip symmetry loses this much per unit of vertical tilt.
pub const TILT_SYMMETRY_GAIN: f64 = 5.0;

/// Maximum number of faces accepted per detector payload (only the first is scored).
pub const MAX_FACES_PER_IMAGE: usize = 16;

/// Maximum landmark points accepted per face.
pub const MAX_POINTS_PER_FACE: usize = 512;

/// Emotion percentages are expected in [0, this].
pub const MAX_EMOTION_PERCENT: f64 = 100.0;
