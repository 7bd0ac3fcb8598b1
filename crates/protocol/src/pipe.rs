//! The engine-side agent proxy: serialization, time budgets and the
//! neutral latch.

use std::process::Command;
use std::time::Duration;

use log::warn;

use starchase_core::{Action, AgentController, Observation};

use crate::error::AgentError;
use crate::transport::{ChildTransport, Transport};

/// An agent gets a generous first budget to load models or warm up.
pub const FIRST_REQUEST_BUDGET: Duration = Duration::from_secs(60);
/// Every later response must land within one second.
pub const REQUEST_BUDGET: Duration = Duration::from_secs(1);

/// One external agent, addressed over a [`Transport`].
///
/// The first failure of any kind latches the agent: it keeps receiving
/// the neutral action for the rest of the match and no further round
/// trips are attempted.
pub struct PipeAgent<T = ChildTransport> {
    name: String,
    transport: T,
    first_done: bool,
    latched: bool,
}

impl PipeAgent<ChildTransport> {
    /// Spawn `program` as a child process agent. The string is split on
    /// whitespace into an executable and its arguments, so a program
    /// whose path contains spaces needs [`PipeAgent::spawn_command`].
    pub fn spawn(program: &str) -> Result<Self, AgentError> {
        Ok(Self::with_transport(program, ChildTransport::spawn(program)?))
    }

    /// Spawn a prepared [`Command`] as a child process agent.
    pub fn spawn_command(
        name: impl Into<String>,
        command: Command,
    ) -> Result<Self, AgentError> {
        Ok(Self::with_transport(name, ChildTransport::spawn_command(command)?))
    }
}

impl<T: Transport> PipeAgent<T> {
    pub fn with_transport(name: impl Into<String>, transport: T) -> Self {
        Self {
            name: name.into(),
            transport,
            first_done: false,
            latched: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_latched(&self) -> bool {
        self.latched
    }

    fn round_trip(&mut self, observation: &Observation) -> Result<Action, AgentError> {
        let request = serde_json::to_string(observation)?;
        self.transport.send(&request)?;

        let budget = if self.first_done {
            REQUEST_BUDGET
        } else {
            FIRST_REQUEST_BUDGET
        };
        let response = self.transport.recv(budget)?;
        Ok(serde_json::from_str(response.trim())?)
    }
}

impl<T: Transport> AgentController for PipeAgent<T> {
    fn request_action(&mut self, observation: &Observation) -> Action {
        if self.latched {
            return Action::NEUTRAL;
        }
        let result = self.round_trip(observation);
        self.first_done = true;
        match result {
            Ok(action) => action,
            Err(error) => {
                warn!("agent {} latched to neutral: {error}", self.name);
                self.latched = true;
                Action::NEUTRAL
            }
        }
    }

    fn shutdown(&mut self) {
        self.transport.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    use glam::Vec2;
    use starchase_core::observation::MyCar;

    fn observation() -> Observation {
        Observation {
            my_car: MyCar {
                position: Vec2::ZERO,
                angle: 0.0,
                velocity_angle: 0.0,
                velocity_length: 0.0,
                steering_angle: 0.0,
                steering_torque: 0.0,
                score: 0,
                crash_energy: 0.0,
            },
            other_cars: Vec::new(),
            obstacles: Vec::new(),
            stars: Vec::new(),
        }
    }

    /// In-memory transport: canned responses, recorded sends and budgets.
    struct FakeTransport {
        sent: Vec<String>,
        responses: VecDeque<Result<String, AgentError>>,
        budgets: Vec<Duration>,
        closed: bool,
    }

    impl FakeTransport {
        fn with_responses(
            responses: impl IntoIterator<Item = Result<String, AgentError>>,
        ) -> Self {
            Self {
                sent: Vec::new(),
                responses: responses.into_iter().collect(),
                budgets: Vec::new(),
                closed: false,
            }
        }

        fn empty() -> Self {
            Self::with_responses([])
        }
    }

    impl Transport for FakeTransport {
        fn send(&mut self, line: &str) -> Result<(), AgentError> {
            self.sent.push(line.to_owned());
            Ok(())
        }

        fn recv(&mut self, timeout: Duration) -> Result<String, AgentError> {
            self.budgets.push(timeout);
            self.responses.pop_front().unwrap_or(Err(AgentError::Exited))
        }

        fn close(&mut self) {
            self.closed = true;
        }
    }

    fn ok(line: &str) -> Result<String, AgentError> {
        Ok(line.to_owned())
    }

    #[test]
    fn parses_a_well_formed_response() {
        let transport = FakeTransport::with_responses([ok(
            r#"{"acceleration":0.5,"braking":0.0,"steering":-0.25}"#,
        )]);
        let mut agent = PipeAgent::with_transport("good", transport);
        let action = agent.request_action(&observation());
        assert_eq!(action.acceleration, 0.5);
        assert_eq!(action.steering, -0.25);
        assert!(!agent.is_latched());
    }

    #[test]
    fn first_budget_is_generous_then_tightens() {
        let line = r#"{"acceleration":0.0,"braking":0.0,"steering":0.0}"#;
        let transport = FakeTransport::with_responses([ok(line), ok(line), ok(line)]);
        let mut agent = PipeAgent::with_transport("prompt", transport);
        for _ in 0..3 {
            agent.request_action(&observation());
        }
        assert_eq!(
            agent.transport.budgets,
            vec![FIRST_REQUEST_BUDGET, REQUEST_BUDGET, REQUEST_BUDGET]
        );
    }

    #[test]
    fn timeout_latches_permanently() {
        let transport =
            FakeTransport::with_responses([Err(AgentError::Timeout(REQUEST_BUDGET))]);
        let mut agent = PipeAgent::with_transport("slow", transport);

        assert_eq!(agent.request_action(&observation()), Action::NEUTRAL);
        assert!(agent.is_latched());

        // Latched agents make no further round trips at all.
        for _ in 0..5 {
            assert_eq!(agent.request_action(&observation()), Action::NEUTRAL);
        }
        assert_eq!(agent.transport.sent.len(), 1);
        assert_eq!(agent.transport.budgets.len(), 1);
    }

    #[test]
    fn malformed_response_latches() {
        let line = r#"{"acceleration":1.0,"braking":0.0,"steering":0.0}"#;
        let transport =
            FakeTransport::with_responses([ok("steering hard to port"), ok(line)]);
        let mut agent = PipeAgent::with_transport("garbled", transport);
        assert_eq!(agent.request_action(&observation()), Action::NEUTRAL);
        assert!(agent.is_latched());
        // The valid follow-up never gets read.
        assert_eq!(agent.request_action(&observation()), Action::NEUTRAL);
        assert_eq!(agent.transport.sent.len(), 1);
    }

    #[test]
    fn dead_process_latches() {
        let transport = FakeTransport::empty();
        let mut agent = PipeAgent::with_transport("dead", transport);
        assert_eq!(agent.request_action(&observation()), Action::NEUTRAL);
        assert!(agent.is_latched());
    }

    #[test]
    fn request_line_is_single_line_json() {
        let line = r#"{"acceleration":0.0,"braking":0.0,"steering":0.0}"#;
        let transport = FakeTransport::with_responses([ok(line)]);
        let mut agent = PipeAgent::with_transport("wire", transport);
        agent.request_action(&observation());
        let sent = &agent.transport.sent[0];
        assert!(!sent.contains('\n'));
        assert!(sent.contains(r#""my_car""#));
        assert!(sent.contains(r#""stars""#));
    }

    #[test]
    fn shutdown_closes_the_transport() {
        let transport = FakeTransport::empty();
        let mut agent = PipeAgent::with_transport("done", transport);
        agent.shutdown();
        assert!(agent.transport.closed);
    }
}
