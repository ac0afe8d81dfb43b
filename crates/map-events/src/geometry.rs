//! Geometry Types
//!
//! Ground-plane and camera-space coordinates shared by every crate.
//!
//! The ground plane is spanned by `x` and `z`; `y` is the vertical axis and is
//! only meaningful for camera positions.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

/// A coordinate on the ground plane.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f32,
    pub z: f32,
}

impl Point2D {
    pub const ZERO: Self = Self { x: 0.0, z: 0.0 };

    pub const fn new(x: f32, z: f32) -> Self {
        Self { x, z }
    }

    /// Euclidean length when treated as a vector.
    pub fn length(self) -> f32 {
        self.x.hypot(self.z)
    }

    /// Euclidean distance to another point.
    pub fn distance(self, other: Point2D) -> f32 {
        (other - self).length()
    }

    /// Unit vector in the same direction, or `None` when the length is below
    /// `epsilon` (the direction is undefined).
    pub fn normalize_or_none(self, epsilon: f32) -> Option<Point2D> {
        let len = self.length();
        if len < epsilon || !len.is_finite() {
            None
        } else {
            Some(Point2D::new(self.x / len, self.z / len))
        }
    }

    /// The vector rotated a quarter turn counter-clockwise.
    pub fn perpendicular(self) -> Point2D {
        Point2D::new(-self.z, self.x)
    }

    /// Angle of the vector measured from the +x axis toward +z.
    pub fn angle(self) -> f32 {
        self.z.atan2(self.x)
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.z.is_finite()
    }
}

impl Add for Point2D {
    type Output = Point2D;

    fn add(self, rhs: Point2D) -> Point2D {
        Point2D::new(self.x + rhs.x, self.z + rhs.z)
    }
}

impl AddAssign for Point2D {
    fn add_assign(&mut self, rhs: Point2D) {
        self.x += rhs.x;
        self.z += rhs.z;
    }
}

impl Sub for Point2D {
    type Output = Point2D;

    fn sub(self, rhs: Point2D) -> Point2D {
        Point2D::new(self.x - rhs.x, self.z - rhs.z)
    }
}

impl Mul<f32> for Point2D {
    type Output = Point2D;

    fn mul(self, rhs: f32) -> Point2D {
        Point2D::new(self.x * rhs, self.z * rhs)
    }
}

impl Neg for Point2D {
    type Output = Point2D;

    fn neg(self) -> Point2D {
        Point2D::new(-self.x, -self.z)
    }
}

/// A coordinate in camera space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3D {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point3D {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}
