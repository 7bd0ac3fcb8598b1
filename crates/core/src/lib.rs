//! Starchase Core - Deterministic Driving Match Simulation
//!
//! Eight cars chase relocating stars around a walled arena for sixty
//! seconds. This crate contains the whole match: the vehicle model, the
//! world objects, the collision scoring rules, the per-tick loop and the
//! egocentric observations served to player agents.
//!
//! # Determinism Rules
//!
//! 1. No `rand::thread_rng()` - Use `SeededRandom` only
//! 2. No system time - Use the tick counter
//! 3. Ordered iteration - `Vec` not `HashMap` for entities
//! 4. No async - Pure synchronous logic; agent I/O lives outside this crate

pub mod agent;
pub mod config;
pub mod error;
pub mod objects;
pub mod observation;
pub mod random;
pub mod vehicle;
pub mod world;

pub use agent::{Action, AgentController};
pub use config::MatchConfig;
pub use error::PlacementError;
pub use observation::{normalize_angle, Observation};
pub use random::SeededRandom;
pub use world::{FrameSnapshot, SimulationWorld};
