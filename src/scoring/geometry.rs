use serde::{Deserialize, Serialize};

/// A 2D point. Body landmarks use normalized [0,1] image coordinates, face
/// landmarks use pixels; nothing here depends on the unit.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "PointRepr")]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

// Face landmark detectors commonly emit `[x, y]` pairs.
#[derive(Deserialize)]
#[serde(untagged)]
enum PointRepr {
    Pair([f64; 2]),
    Object { x: f64, y: f64 },
}

impl From<PointRepr> for Point {
    fn from(value: PointRepr) -> Self {
        match value {
            PointRepr::Pair([x, y]) => Point::new(x, y),
            PointRepr::Object { x, y } => Point::new(x, y),
        }
    }
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Point `t` of the way from `self` toward `target`, per axis.
    pub fn toward(&self, target: &Point, t: f64) -> Point {
        Point::new(
            self.x - (self.x - target.x) * t,
            self.y - (self.y - target.y) * t,
        )
    }

    /// Mirror across the vertical line `x = midline`.
    pub fn reflect_x(&self, midline: f64) -> Point {
        Point::new(2.0 * midline - self.x, self.y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

pub fn midpoint(a: &Point, b: &Point) -> Point {
    Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// `numerator / denominator`, or 0 when the denominator is not positive.
pub fn safe_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        let value = numerator / denominator;
        if value.is_finite() {
            return value;
        }
    }
    0.0
}

/// Axis-aligned bounds of a point cloud.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn enclosing(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let init = Self {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        Some(points.iter().skip(1).fold(init, |b, p| Self {
            min_x: b.min_x.min(p.x),
            min_y: b.min_y.min(p.y),
            max_x: b.max_x.max(p.x),
            max_y: b.max_y.max(p.y),
        }))
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn diagonal(&self) -> f64 {
        self.width().hypot(self.height())
    }

    pub fn center_x(&self) -> f64 {
        (self.min_x + self.max_x) / 2.0
    }
}
