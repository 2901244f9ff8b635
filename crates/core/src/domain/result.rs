// Command Result Domain Model

use crate::domain::error::{DomainError, Result};
use crate::domain::task::TaskState;
use std::collections::BTreeMap;
use tokio::process::Child;
use tokio::sync::mpsc;

/// Chunk of server log text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogPayload {
    pub lines: Vec<String>,
    /// URL to poll for the next chunk, when the server announces one
    pub next_url: Option<String>,
}

/// Live server process started by a local runner
#[derive(Debug)]
pub struct LaunchedProcess {
    pub pid: Option<u32>,
    pub child: Child,
    /// Merged stdout/stderr lines in arrival order
    pub output: mpsc::Receiver<String>,
}

/// Typed value of a completed command
#[derive(Debug)]
pub enum ResultValue {
    Text(String),
    List(Vec<String>),
    Map(BTreeMap<String, String>),
    Log(LogPayload),
    Process(LaunchedProcess),
}

impl ResultValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResultValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            ResultValue::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            ResultValue::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_log(&self) -> Option<&LogPayload> {
        match self {
            ResultValue::Log(l) => Some(l),
            _ => None,
        }
    }

    pub fn into_process(self) -> Option<LaunchedProcess> {
        match self {
            ResultValue::Process(p) => Some(p),
            _ => None,
        }
    }
}

/// Outcome of one command execution
///
/// Owned by the runner while it executes. The state only moves along the
/// task state machine and the value is written once.
#[derive(Debug)]
pub struct CommandResult {
    command: String,
    state: TaskState,
    auth_ok: bool,
    retry: bool,
    message: Option<String>,
    value: Option<ResultValue>,
}

impl CommandResult {
    /// Fresh result in READY state
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            state: TaskState::Ready,
            auth_ok: true,
            retry: false,
            message: None,
            value: None,
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    pub fn auth_ok(&self) -> bool {
        self.auth_ok
    }

    /// Server asked the caller to resubmit later
    pub fn retry_requested(&self) -> bool {
        self.retry
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn value(&self) -> Option<&ResultValue> {
        self.value.as_ref()
    }

    pub fn into_value(self) -> Option<ResultValue> {
        self.value
    }

    pub fn is_success(&self) -> bool {
        self.state == TaskState::Completed
    }

    /// Advance the state machine
    pub fn advance(&mut self, next: TaskState) -> Result<()> {
        if !self.state.can_advance_to(next) {
            return Err(DomainError::InvalidStateTransition {
                from: self.state.to_string(),
                to: next.to_string(),
            });
        }
        self.state = next;
        Ok(())
    }

    /// Write the typed value (once)
    pub fn set_value(&mut self, value: ResultValue) -> Result<()> {
        if self.state.is_terminal() || self.value.is_some() {
            return Err(DomainError::ValueAlreadySet(self.command.clone()));
        }
        self.value = Some(value);
        Ok(())
    }

    pub(crate) fn set_message(&mut self, message: Option<String>) {
        if !self.state.is_terminal() {
            self.message = message;
        }
    }

    pub(crate) fn mark_auth_failed(&mut self) {
        if !self.state.is_terminal() {
            self.auth_ok = false;
        }
    }

    pub(crate) fn mark_retry(&mut self) {
        if !self.state.is_terminal() {
            self.retry = true;
        }
    }
}
