//! Points and angle helpers.
//!
//! Angles are in degrees, measured counter-clockwise on screen from east with
//! the y axis pointing down: a target straight above the observer has a
//! bearing of 90°, one to the east 0°, one below 270°.

use serde::{Deserialize, Serialize};

/// A continuous world position in pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Point { x, y }
    }

    /// Euclidean distance
    pub fn distance(&self, other: &Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// True when `other` lies inside the square of half-width `tolerance`
    /// centred on this point.
    pub fn is_within(&self, other: &Point, tolerance: f32) -> bool {
        (self.x - other.x).abs() <= tolerance && (self.y - other.y).abs() <= tolerance
    }

    /// Move `distance` pixels along `heading`
    pub fn advanced(&self, heading: f32, distance: f32) -> Point {
        let (dx, dy) = heading_vector(heading);
        Point::new(self.x + dx * distance, self.y + dy * distance)
    }
}

/// Wrap an angle into [0, 360).
pub fn normalize_degrees(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// `angle + by`, wrapped into [0, 360).
pub fn rotate_degrees(angle: f32, by: f32) -> f32 {
    normalize_degrees(angle + by)
}

/// Bearing from `from` to `to`: `360 - atan2(dy, dx)` in degrees, wrapped
/// into [0, 360).
pub fn bearing(from: Point, to: Point) -> f32 {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let deg = dy.atan2(dx).to_degrees();
    normalize_degrees(360.0 - deg)
}

/// Shortest signed difference `target - current`, in [-180, 180).
pub fn angle_delta(target: f32, current: f32) -> f32 {
    (target - current + 180.0).rem_euclid(360.0) - 180.0
}

/// Unit vector for a heading. Heading 90° points up the screen (negative y).
pub fn heading_vector(heading: f32) -> (f32, f32) {
    let rad = heading.to_radians();
    (rad.cos(), -rad.sin())
}
