//! Points, rectangles and rotated coordinate frames.
//!
//! Every layer rotates about its own pivot. Handles are drawn in the rotated
//! frame, but hit-testing and resize math are done in the layer's local
//! (un-rotated) frame. [`to_local_frame`] and [`from_local_frame`] are the
//! only places that trig happens; the renderer and the interaction engine
//! both go through them.
//!
//! Angles are degrees at the API boundary. Rotation is clockwise-positive in
//! a y-down frame.

use serde::{Deserialize, Serialize};

/// A point (or vector) in canvas space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate (pixels from the left edge).
    pub x: f32,
    /// Vertical coordinate (pixels from the top edge).
    pub y: f32,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance_to(self, other: Self) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Whether `other` lies within `radius` of this point (inclusive).
    #[must_use]
    pub fn is_within(self, other: Self, radius: f32) -> bool {
        self.distance_to(other) <= radius
    }
}

impl std::ops::Add for Point {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Point {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// An axis-aligned rectangle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
}

impl Rect {
    /// Create a new rectangle.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build a rectangle from two opposite corners.
    #[must_use]
    pub fn from_corners(a: Point, b: Point) -> Self {
        let x = a.x.min(b.x);
        let y = a.y.min(b.y);
        Self::new(x, y, (a.x - b.x).abs(), (a.y - b.y).abs())
    }

    /// Geometric center.
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Right edge.
    #[must_use]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Inclusive point-in-rectangle test.
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }
}

/// Rotate a vector by `degrees` (clockwise in a y-down frame).
#[must_use]
pub fn rotate_vector(v: Point, degrees: f32) -> Point {
    if degrees == 0.0 {
        return v;
    }
    let rad = degrees.to_radians();
    let (sin, cos) = rad.sin_cos();
    Point::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

/// Map a canvas-space point into the un-rotated frame of a layer that is
/// rotated by `rotation_deg` about `pivot`.
#[must_use]
pub fn to_local_frame(pivot: Point, rotation_deg: f32, point: Point) -> Point {
    pivot + rotate_vector(point - pivot, -rotation_deg)
}

/// Inverse of [`to_local_frame`]: map a local-frame point back to canvas space.
#[must_use]
pub fn from_local_frame(pivot: Point, rotation_deg: f32, point: Point) -> Point {
    pivot + rotate_vector(point - pivot, rotation_deg)
}

/// Angle of `point` as seen from `pivot`, in degrees (`atan2(dy, dx)`).
#[must_use]
pub fn angle_from(pivot: Point, point: Point) -> f32 {
    let d = point - pivot;
    d.y.atan2(d.x).to_degrees()
}
