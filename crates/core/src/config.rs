//! Match configuration and tuning constants.

use serde::{Deserialize, Serialize};

/// Crash energy repaired per tick while a car is stunned; also the unit
/// the `crash_energy` observation field is expressed in.
pub const CRASH_ENERGY_UNIT: f32 = 100_000.0;

/// Force applied per unit of the `acceleration` action component.
pub const ACCELERATE_SCALE: f32 = 20_000.0;
/// Force applied per unit of the `braking` action component.
pub const BRAKE_SCALE: f32 = 200_000.0;
/// Torque applied per unit of the `steering` action component.
pub const STEER_SCALE: f32 = 20_000.0;

/// Standard deviation of the Gaussian jitter added to each actuated
/// action component.
pub const CONTROL_NOISE_SIGMA: f32 = 0.05;

/// Half-extent of the square arena bounded by the walls.
pub const ARENA_HALF_EXTENT: f32 = 1000.0;
/// Radius of the circle the cars spawn on.
pub const SPAWN_RADIUS: f32 = 80.0;

/// The placement sampler gives up after this many rejected candidates.
pub const PLACEMENT_RETRY_CAP: u32 = 10_000;

/// Parameters of one match. `Default` is the reference match: eight cars,
/// sixty seconds at thirty ticks per second.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchConfig {
    pub tick_rate: u32,
    pub duration_secs: u32,
    pub car_count: usize,
    pub obstacle_count: usize,
    pub star_count: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            tick_rate: 30,
            duration_secs: 60,
            car_count: 8,
            obstacle_count: 40,
            star_count: 2,
        }
    }
}

impl MatchConfig {
    pub fn dt(&self) -> f32 {
        1.0 / self.tick_rate as f32
    }

    pub fn total_ticks(&self) -> u32 {
        self.duration_secs * self.tick_rate
    }

    /// Crash energy saturates at ten seconds' worth of repair.
    pub fn crash_energy_max(&self) -> f32 {
        10.0 * self.tick_rate as f32 * CRASH_ENERGY_UNIT
    }
}
