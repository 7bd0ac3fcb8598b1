//! The seam between the simulation and player controllers.

use serde::{Deserialize, Serialize};

use crate::observation::Observation;

/// One tick's control inputs for a car. This is also the wire schema:
/// agents answer each observation line with one JSON object of these
/// three fields.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Action {
    pub acceleration: f32,
    pub braking: f32,
    pub steering: f32,
}

impl Action {
    pub const NEUTRAL: Self = Self {
        acceleration: 0.0,
        braking: 0.0,
        steering: 0.0,
    };

    /// Clamp every component into its legal range: acceleration and
    /// steering to [-1, 1], braking to [0, 1].
    pub fn clipped(self) -> Self {
        Self {
            acceleration: self.acceleration.clamp(-1.0, 1.0),
            braking: self.braking.clamp(0.0, 1.0),
            steering: self.steering.clamp(-1.0, 1.0),
        }
    }
}

/// A controller driving one car. Implemented over process pipes by
/// `starchase-protocol`; in-process implementations serve tests and bots.
pub trait AgentController {
    /// Produce the car's action for this tick.
    fn request_action(&mut self, observation: &Observation) -> Action;

    /// Release external resources. Called once when the match ends.
    fn shutdown(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clipping_bounds_every_component() {
        let action = Action {
            acceleration: -3.0,
            braking: -0.5,
            steering: 7.0,
        };
        let clipped = action.clipped();
        assert_eq!(clipped.acceleration, -1.0);
        assert_eq!(clipped.braking, 0.0);
        assert_eq!(clipped.steering, 1.0);
    }

    #[test]
    fn in_range_action_is_untouched() {
        let action = Action {
            acceleration: 0.25,
            braking: 0.5,
            steering: -0.75,
        };
        assert_eq!(action.clipped(), action);
    }

    #[test]
    fn action_wire_format() {
        let json = serde_json::to_string(&Action::NEUTRAL).unwrap();
        assert_eq!(
            json,
            r#"{"acceleration":0.0,"braking":0.0,"steering":0.0}"#
        );
    }
}
