//! Starchase Physics Engine
//!
//! A minimal deterministic 2D rigid-body engine for the starchase
//! simulation. It provides exactly the surface the simulation needs:
//!
//! - Dynamic and static bodies carrying circle, convex-polygon and thick
//!   segment shapes
//! - Pivot and rotary-limit joints
//! - Per-body velocity-update callbacks, invoked after the default
//!   force integration of each step
//! - Contact-begin callbacks that may suppress the physical response, and
//!   post-solve callbacks carrying a kinetic-energy estimate
//!
//! # Determinism Rules
//!
//! 1. `Vec`-ordered iteration on every solve path
//! 2. Persistent pair state in a `BTreeMap`, never a hash map
//! 3. No system time, no global state - `step(dt)` is a pure transition

pub mod body;
pub mod collision;
pub mod joint;
pub mod shape;
pub mod world;

pub use body::{BodyId, BodyType, RigidBody};
pub use collision::Contact;
pub use joint::Joint;
pub use shape::Shape;
pub use world::{ContactEvent, NoEvents, StepEvents, World};
