use serde_json::{json, Value};

/// Nine visible joints of an upright person, keyed by joint name.
pub fn standing_person() -> Value {
    let at = |x: f64, y: f64| json!({ "x": x, "y": y, "visibility": 0.99 });
    json!({
        "nose": at(0.5, 0.15),
        "left_shoulder": at(0.35, 0.3),
        "right_shoulder": at(0.65, 0.3),
        "left_hip": at(0.4, 0.6),
        "right_hip": at(0.6, 0.6),
        "left_knee": at(0.4, 0.8),
        "right_knee": at(0.6, 0.8),
        "left_ankle": at(0.4, 1.0),
        "right_ankle": at(0.6, 1.0),
    })
}

/// The same person as a 33-entry MediaPipe pose list.
pub fn standing_pose_list() -> Value {
    let person = standing_person();
    let indices = [
        ("nose", 0),
        ("left_shoulder", 11),
        ("right_shoulder", 12),
        ("left_hip", 23),
        ("right_hip", 24),
        ("left_knee", 25),
        ("right_knee", 26),
        ("left_ankle", 27),
        ("right_ankle", 28),
    ];
    let mut points = vec![json!({ "x": 0.5, "y": 0.5, "visibility": 0.2 }); 33];
    for (name, index) in indices {
        points[index] = person[name].clone();
    }
    Value::Array(points)
}

pub fn neutral_face() -> Value {
    json!({
        "left_eye": [[30.0, 40.0], [40.0, 38.0]],
        "right_eye": [[60.0, 38.0], [70.0, 40.0]],
        "nose_bridge": [[50.0, 45.0], [50.0, 55.0]],
        "top_lip": [[40.0, 75.0], [60.0, 75.0]],
        "bottom_lip": [[42.0, 82.0], [58.0, 82.0]],
    })
}

/// Classifier output with only the `happy` class set, so it scores as `happy`.
pub fn smiling(happy: f64) -> Value {
    json!({ "happy": happy })
}
