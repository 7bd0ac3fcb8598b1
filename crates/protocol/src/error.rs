//! Agent channel errors. All of them are non-fatal to the match: the
//! engine's only response is to latch the offending agent to neutral.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("no response within {0:?}")]
    Timeout(Duration),

    #[error("malformed response: {0}")]
    Protocol(#[from] serde_json::Error),

    #[error("pipe error: {0}")]
    Io(#[from] std::io::Error),

    #[error("agent process exited")]
    Exited,
}
