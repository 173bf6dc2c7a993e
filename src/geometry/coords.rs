//! Plain value types for physical and virtual coordinates.

use serde::{Deserialize, Serialize};

/// A point in the sensor's 3D reference frame.
///
/// `x` and `y` are pixel-like integer coordinates in the depth image,
/// `z` is the depth reading in sensor units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coord3D {
    pub x: i32,
    pub y: i32,
    pub z: f64,
}

impl Coord3D {
    /// Create a new physical coordinate.
    pub fn new(x: i32, y: i32, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Planar (x/y) distance to another physical point, ignoring depth.
    ///
    /// Tap-drift checks compare finger positions on the touch plane, where
    /// depth jitter would only add noise.
    pub fn planar_distance(&self, other: &Self) -> f64 {
        let dx = (self.x - other.x) as f64;
        let dy = (self.y - other.y) as f64;
        (dx * dx + dy * dy).sqrt()
    }
}

/// A point in the projected screen's 2D pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Coord2D {
    pub x: i32,
    pub y: i32,
}

impl Coord2D {
    /// Create a new virtual coordinate.
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another virtual point.
    pub fn distance(&self, other: &Self) -> f64 {
        let dx = (self.x - other.x) as f64;
        let dy = (self.y - other.y) as f64;
        (dx * dx + dy * dy).sqrt()
    }

    /// Clamp both components into `0..width` x `0..height`.
    pub fn clamped(&self, width: i32, height: i32) -> Self {
        Self {
            x: self.x.clamp(0, (width - 1).max(0)),
            y: self.y.clamp(0, (height - 1).max(0)),
        }
    }
}
