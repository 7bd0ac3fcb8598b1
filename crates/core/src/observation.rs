//! What a car sees each tick.
//!
//! Everything except the car's own pose is egocentric: positions and
//! velocities of other objects are expressed as angle/length pairs in the
//! observing car's frame. The serde field names are the wire schema.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Wrap an angle into (-pi, pi]. Idempotent.
pub fn normalize_angle(angle: f32) -> f32 {
    use core::f32::consts::{PI, TAU};
    let wrapped = angle.rem_euclid(TAU);
    if wrapped > PI {
        wrapped - TAU
    } else {
        wrapped
    }
}

/// The full per-tick observation served to one agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    pub my_car: MyCar,
    pub other_cars: Vec<OtherCar>,
    pub obstacles: Vec<Sighting>,
    pub stars: Vec<Sighting>,
}

/// The observing car. Velocity is rotated into the car frame and its
/// length is expressed per tick; `steering_torque` and `crash_energy`
/// are scaled down to roughly unit range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MyCar {
    pub position: Vec2,
    pub angle: f32,
    pub velocity_angle: f32,
    pub velocity_length: f32,
    pub steering_angle: f32,
    pub steering_torque: f32,
    pub score: u32,
    pub crash_energy: f32,
}

/// Another car, relative to the observer: bearing/distance, relative
/// heading and relative velocity in the observer's frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtherCar {
    pub position_angle: f32,
    pub position_length: f32,
    pub angle: f32,
    pub velocity_angle: f32,
    pub velocity_length: f32,
    pub steering_angle: f32,
    pub score: u32,
    pub crash_energy: f32,
}

/// An obstacle or star: bearing and distance only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sighting {
    pub position_angle: f32,
    pub position_length: f32,
}

impl Sighting {
    /// Bearing/distance of `target` as seen from a car at `position`
    /// heading `angle`.
    pub fn of(target: Vec2, position: Vec2, angle: f32) -> Self {
        let delta = Vec2::from_angle(-angle).rotate(target - position);
        Self {
            position_angle: normalize_angle(delta.y.atan2(delta.x)),
            position_length: delta.length(),
        }
    }
}
