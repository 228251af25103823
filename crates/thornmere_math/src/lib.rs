//! Vector and bounding-box primitives shared across the Thornmere crates.
//!
//! Mirrors the role `valence_math`/`valence_core::aabb` play in the teacher
//! workspace: a tiny leaf crate every other crate depends on for geometry.

use std::ops::Add;

use glam::DVec3;
use serde::{Deserialize, Serialize};

pub use glam::DVec3 as Vec3;

/// An axis-aligned bounding box. `min` is expected to be <= `max`
/// componentwise.
#[derive(Copy, Clone, PartialEq, Default, Debug, Serialize, Deserialize)]
pub struct Aabb {
    pub min: DVec3,
    pub max: DVec3,
}

impl Aabb {
    pub fn new(p0: impl Into<DVec3>, p1: impl Into<DVec3>) -> Self {
        let p0 = p0.into();
        let p1 = p1.into();
        Self {
            min: p0.min(p1),
            max: p0.max(p1),
        }
    }

    /// Whether `point` lies within this box (inclusive on all faces).
    pub fn contains(&self, point: DVec3) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    pub fn intersects(&self, other: Aabb) -> bool {
        self.max.x >= other.min.x
            && other.max.x >= self.min.x
            && self.max.y >= other.min.y
            && other.max.y >= self.min.y
            && self.max.z >= other.min.z
            && other.max.z >= self.min.z
    }

    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }
}

impl Add<DVec3> for Aabb {
    type Output = Aabb;

    fn add(self, rhs: DVec3) -> Self::Output {
        Self {
            min: self.min + rhs,
            max: self.max + rhs,
        }
    }
}

/// Horizontal + vertical straight-line distance between two points.
pub fn distance(a: DVec3, b: DVec3) -> f64 {
    (a - b).length()
}

/// Horizontal-only distance, ignoring the `y` (vertical) axis. Useful for
/// ground-clamped speed checks where vertical motion is validated separately.
pub fn horizontal_distance(a: DVec3, b: DVec3) -> f64 {
    let dx = a.x - b.x;
    let dz = a.z - b.z;
    (dx * dx + dz * dz).sqrt()
}
