//! Joints: pivot (point-to-point) and rotary-limit constraints.

use glam::Vec2;

use crate::body::BodyId;

#[derive(Debug, Clone)]
pub enum Joint {
    /// Pins a body-local anchor of `a` to a body-local anchor of `b`.
    /// Translation-only constraint; relative rotation stays free.
    Pivot {
        a: BodyId,
        b: BodyId,
        anchor_a: Vec2,
        anchor_b: Vec2,
    },
    /// Restricts the relative angle `angle(b) - angle(a)` to `[min, max]`.
    /// A zero-width range locks the two bodies' rotation together.
    RotaryLimit {
        a: BodyId,
        b: BodyId,
        min: f32,
        max: f32,
    },
}

impl Joint {
    /// Pivot joint anchored at a world point, given the current body poses.
    pub fn pivot(
        a: BodyId,
        b: BodyId,
        world_anchor: Vec2,
        pose_a: (Vec2, f32),
        pose_b: (Vec2, f32),
    ) -> Self {
        let anchor_a = Vec2::from_angle(-pose_a.1).rotate(world_anchor - pose_a.0);
        let anchor_b = Vec2::from_angle(-pose_b.1).rotate(world_anchor - pose_b.0);
        Joint::Pivot {
            a,
            b,
            anchor_a,
            anchor_b,
        }
    }

    pub fn rotary_limit(a: BodyId, b: BodyId, min: f32, max: f32) -> Self {
        Joint::RotaryLimit { a, b, min, max }
    }

    pub fn bodies(&self) -> (BodyId, BodyId) {
        match *self {
            Joint::Pivot { a, b, .. } => (a, b),
            Joint::RotaryLimit { a, b, .. } => (a, b),
        }
    }
}
