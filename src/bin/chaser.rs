//! A bundled reference agent speaking the line protocol on stdio:
//! steer at the nearest star, flat out when it is dead ahead, shed
//! speed before turning hard.

use std::io::{self, BufRead, Write};

use starchase_core::{Action, Observation};

const AHEAD_CONE: f32 = core::f32::consts::PI / 8.0;
const TURNING_SPEED: f32 = 2.5;

fn decide(observation: &Observation) -> Action {
    let Some(nearest) = observation
        .stars
        .iter()
        .min_by(|a, b| a.position_length.total_cmp(&b.position_length))
    else {
        return Action::NEUTRAL;
    };

    let bearing = nearest.position_angle;
    if bearing.abs() < AHEAD_CONE {
        // Dead ahead: full throttle, gentle correction.
        Action {
            acceleration: 1.0,
            braking: 0.0,
            steering: bearing * 0.5,
        }
    } else if observation.my_car.velocity_length > TURNING_SPEED {
        // Too fast to turn; slow down first.
        Action {
            acceleration: 0.0,
            braking: 1.0,
            steering: 0.0,
        }
    } else {
        Action {
            acceleration: 0.25,
            braking: 0.0,
            steering: bearing * 2.0,
        }
    }
}

fn main() -> io::Result<()> {
    eprintln!("*** chaser ***");

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut output = stdout.lock();

    for line in stdin.lock().lines() {
        let line = line?;
        let action = match serde_json::from_str::<Observation>(&line) {
            Ok(observation) => decide(&observation),
            Err(error) => {
                eprintln!("chaser: bad observation line: {error}");
                Action::NEUTRAL
            }
        };
        serde_json::to_writer(&mut output, &action)?;
        output.write_all(b"\n")?;
        output.flush()?;
    }

    eprintln!("chaser: finished");
    Ok(())
}
