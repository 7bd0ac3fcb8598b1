//! Simulation errors.

use thiserror::Error;

/// Failure to find a legal position for an obstacle or star. Raised at
/// world construction or star relocation when the rejection sampler
/// exhausts its retry budget; there is no way to continue the match.
#[derive(Debug, Error)]
pub enum PlacementError {
    #[error("no legal placement found after {attempts} attempts")]
    Exhausted { attempts: u32 },
}
