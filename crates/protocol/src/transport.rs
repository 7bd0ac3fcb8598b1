//! Byte transport underneath the agent protocol.
//!
//! [`ChildTransport`] is the real thing: a spawned child process with
//! piped stdin/stdout. Its stdout is drained by a dedicated reader thread
//! feeding a channel, so waiting for a response line honors a deadline
//! instead of blocking on the pipe.

use std::io::{self, BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use log::debug;

use crate::error::AgentError;

/// One line out, one line in. Factored out of [`crate::PipeAgent`] so
/// the budget and latch logic can be tested with an in-memory fake.
pub trait Transport {
    /// Send one request line (without the trailing newline).
    fn send(&mut self, line: &str) -> Result<(), AgentError>;

    /// Wait up to `timeout` for one response line.
    fn recv(&mut self, timeout: Duration) -> Result<String, AgentError>;

    /// Tear the channel down. Must be idempotent.
    fn close(&mut self);
}

/// A child process spoken to over its standard pipes.
pub struct ChildTransport {
    child: Child,
    stdin: Option<ChildStdin>,
    lines: Receiver<io::Result<String>>,
}

impl ChildTransport {
    /// Spawn `program` with whitespace-separated arguments, stderr
    /// passed through to ours. Paths containing spaces cannot be
    /// expressed this way; build the [`Command`] yourself and use
    /// [`Self::spawn_command`].
    pub fn spawn(program: &str) -> Result<Self, AgentError> {
        let mut parts = program.split_whitespace();
        let executable = parts
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty agent command"))?;
        let mut command = Command::new(executable);
        command.args(parts);
        Self::spawn_command(command)
    }

    /// Spawn a prepared [`Command`], taking over its stdin and stdout.
    pub fn spawn_command(mut command: Command) -> Result<Self, AgentError> {
        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()?;
        let stdin = child.stdin.take();
        let stdout = child.stdout.take().ok_or(AgentError::Exited)?;

        let (sender, lines) = mpsc::channel();
        thread::spawn(move || {
            let reader = BufReader::new(stdout);
            for line in reader.lines() {
                if sender.send(line).is_err() {
                    break;
                }
            }
            // Receiver side sees the hangup as a disconnect.
        });

        Ok(Self {
            child,
            stdin,
            lines,
        })
    }
}

impl Transport for ChildTransport {
    fn send(&mut self, line: &str) -> Result<(), AgentError> {
        let stdin = self.stdin.as_mut().ok_or(AgentError::Exited)?;
        stdin.write_all(line.as_bytes())?;
        stdin.write_all(b"\n")?;
        stdin.flush()?;
        Ok(())
    }

    fn recv(&mut self, timeout: Duration) -> Result<String, AgentError> {
        match self.lines.recv_timeout(timeout) {
            Ok(Ok(line)) => Ok(line),
            Ok(Err(error)) => Err(error.into()),
            Err(RecvTimeoutError::Timeout) => Err(AgentError::Timeout(timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(AgentError::Exited),
        }
    }

    fn close(&mut self) {
        // Closing stdin first gives a well-behaved agent its EOF.
        self.stdin = None;
        if self.child.kill().is_ok() {
            let _ = self.child.wait();
            debug!("agent process reaped");
        }
    }
}

impl Drop for ChildTransport {
    fn drop(&mut self) {
        self.close();
    }
}
