use serde::{Deserialize, Serialize};

/// Tolerance for comparisons of computed coordinates.
pub const EPSILON: f64 = 1e-6;

/// Axis-aligned rectangle in layout units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// True when `other` lies inside this rectangle, within [`EPSILON`].
    pub fn contains(&self, other: &Rect) -> bool {
        other.x >= self.x - EPSILON
            && other.y >= self.y - EPSILON
            && other.right() <= self.right() + EPSILON
            && other.bottom() <= self.bottom() + EPSILON
    }

    /// Area shared with `other`; zero when they only touch.
    pub fn intersection_area(&self, other: &Rect) -> f64 {
        let w = self.right().min(other.right()) - self.x.max(other.x);
        let h = self.bottom().min(other.bottom()) - self.y.max(other.y);
        if w <= 0.0 || h <= 0.0 {
            0.0
        } else {
            w * h
        }
    }

    pub fn overlaps(&self, other: &Rect) -> bool {
        self.intersection_area(other) > EPSILON
    }

    /// Width over height or its inverse, whichever is at least 1.
    pub fn aspect_ratio(&self) -> f64 {
        if self.is_empty() {
            return f64::INFINITY;
        }
        (self.width / self.height).max(self.height / self.width)
    }
}
