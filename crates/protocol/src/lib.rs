//! Agent protocol for starchase.
//!
//! Player agents are ordinary child processes. Each tick the engine
//! writes one JSON observation line to the agent's stdin and reads one
//! JSON action line back from its stdout, within a hard time budget. An
//! agent that times out, exits or answers garbage is latched to the
//! neutral action for the rest of the match; the match itself never
//! stalls or fails because of a misbehaving agent.

pub mod error;
pub mod pipe;
pub mod transport;

pub use error::AgentError;
pub use pipe::{PipeAgent, FIRST_REQUEST_BUDGET, REQUEST_BUDGET};
pub use transport::{ChildTransport, Transport};
