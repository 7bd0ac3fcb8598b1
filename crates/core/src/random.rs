//! Deterministic seeded random number generator.
//!
//! Uses the xorshift32 algorithm for fast, deterministic pseudo-random
//! numbers. The match carries two independent streams (placement and
//! control noise) so that agent-visible jitter never perturbs where the
//! next star appears.

use serde::{Deserialize, Serialize};

/// Deterministic seeded random number generator using xorshift32.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeededRandom {
    state: u32,
}

impl SeededRandom {
    /// Creates a new RNG with the given seed.
    /// Seed of 0 is treated as 1 to avoid degenerate sequence.
    pub fn new(seed: u32) -> Self {
        Self {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    /// Returns the raw u32 value from the RNG.
    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Returns a random float between 0 (inclusive) and 1 (exclusive).
    pub fn next(&mut self) -> f32 {
        (self.next_u32() as f64 / (u32::MAX as f64 + 1.0)) as f32
    }

    /// Returns a random float in the range [min, max).
    pub fn next_range(&mut self, min: f32, max: f32) -> f32 {
        min + self.next() * (max - min)
    }

    /// Returns a normally distributed float (Box-Muller transform).
    pub fn gauss(&mut self, mu: f32, sigma: f32) -> f32 {
        // xorshift32 never yields 0, so ln() stays finite.
        let u1 = self.next().max(f32::MIN_POSITIVE);
        let u2 = self.next();
        let r = (-2.0 * u1.ln()).sqrt();
        mu + sigma * r * (core::f32::consts::TAU * u2).cos()
    }

    /// Returns the current internal state (for serialization/debugging).
    pub fn seed(&self) -> u32 {
        self.state
    }
}

impl Default for SeededRandom {
    fn default() -> Self {
        Self::new(1)
    }
}
