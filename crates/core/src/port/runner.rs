// Runner Port
// Common execution contract implemented once per transport

use crate::domain::{Command, ResultValue, TaskEvent};
use crate::port::ServerEntity;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Failure classification of one command execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Missing tool configuration, unknown interface or version
    Config,
    /// Malformed URL, header preparation, request construction
    Protocol,
    /// Connection refused or I/O failure mid-exchange
    Transport,
    /// Login exception embedded in the response payload
    Auth,
    /// HTTP 401/403
    AuthHttp,
    /// HTTP 502, usually a misconfigured proxy
    BadGateway,
    NoJavaVm,
    WrongJavaVm,
    /// Child process could not be spawned or driven
    ProcessLaunch,
    /// Server reported the command as failed
    CommandFailed,
    /// Local artifact path missing or unreadable
    InvalidPath,
    /// Response body could not be read or interpreted
    Response,
}

impl ErrorKind {
    /// Event emitted with the FAILED transition
    pub fn event(self) -> TaskEvent {
        match self {
            ErrorKind::Config | ErrorKind::Protocol => TaskEvent::Exception,
            ErrorKind::Transport => TaskEvent::TransportFailed,
            ErrorKind::Auth => TaskEvent::AuthFailed,
            ErrorKind::AuthHttp => TaskEvent::AuthFailedHttp,
            ErrorKind::BadGateway => TaskEvent::BadGateway,
            ErrorKind::NoJavaVm => TaskEvent::NoJavaVm,
            ErrorKind::WrongJavaVm => TaskEvent::WrongJavaVm,
            ErrorKind::ProcessLaunch => TaskEvent::JavaVmExecFailed,
            ErrorKind::CommandFailed => TaskEvent::CmdFailed,
            ErrorKind::InvalidPath => TaskEvent::InvalidPath,
            ErrorKind::Response => TaskEvent::EmptyMessage,
        }
    }

    pub fn is_auth(self) -> bool {
        matches!(self, ErrorKind::Auth | ErrorKind::AuthHttp)
    }

    /// Only transport failures are worth another attempt
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::Transport)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::Config => "configuration error",
            ErrorKind::Protocol => "protocol error",
            ErrorKind::Transport => "transport error",
            ErrorKind::Auth => "authentication failed",
            ErrorKind::AuthHttp => "HTTP authentication failed",
            ErrorKind::BadGateway => "bad gateway, check proxy settings",
            ErrorKind::NoJavaVm => "no usable JVM",
            ErrorKind::WrongJavaVm => "unsupported JVM version",
            ErrorKind::ProcessLaunch => "process launch failed",
            ErrorKind::CommandFailed => "command failed",
            ErrorKind::InvalidPath => "invalid path",
            ErrorKind::Response => "unreadable response",
        };
        f.write_str(s)
    }
}

/// Typed command failure, formatted to text only at the boundary
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}{}", detail(.message))]
pub struct CommandError {
    pub kind: ErrorKind,
    pub message: Option<String>,
}

fn detail(message: &Option<String>) -> String {
    message.as_deref().map(|m| format!(": {m}")).unwrap_or_default()
}

impl CommandError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: Some(message.into()),
        }
    }

    pub fn bare(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
        }
    }
}

/// Transport strategy a runner implements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunnerStrategy {
    Http,
    Rest,
    Asadmin,
    LocalJvm,
}

impl std::fmt::Display for RunnerStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunnerStrategy::Http => write!(f, "http"),
            RunnerStrategy::Rest => write!(f, "rest"),
            RunnerStrategy::Asadmin => write!(f, "asadmin"),
            RunnerStrategy::LocalJvm => write!(f, "local-jvm"),
        }
    }
}

/// Runner bound to one (server, command) pair
///
/// `execute` performs the transport-specific exchange and returns the typed
/// value. State transitions and listener notifications are driven by the
/// shared lifecycle in `application::lifecycle`.
#[async_trait]
pub trait Runner: Send + Sync {
    fn strategy(&self) -> RunnerStrategy;

    fn command(&self) -> &Arc<Command>;

    fn server(&self) -> &Arc<dyn ServerEntity>;

    /// Execute the command
    ///
    /// # Errors
    /// A `CommandError` whose kind classifies the failure
    async fn execute(&self) -> Result<Option<ResultValue>, CommandError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Mock runner behavior
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Succeed with a text value
        Text(String),
        /// Fail with the given kind
        Fail(ErrorKind, String),
        /// Sleep, then succeed with a text value
        Slow(Duration, String),
        /// Panic with message
        Panic(String),
    }

    pub struct MockRunner {
        command: Arc<Command>,
        server: Arc<dyn ServerEntity>,
        behavior: MockBehavior,
        calls: Arc<AtomicUsize>,
    }

    impl MockRunner {
        pub fn new(
            server: Arc<dyn ServerEntity>,
            command: Arc<Command>,
            behavior: MockBehavior,
        ) -> Self {
            Self {
                command,
                server,
                behavior,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        pub fn call_counter(&self) -> Arc<AtomicUsize> {
            Arc::clone(&self.calls)
        }
    }

    #[async_trait]
    impl Runner for MockRunner {
        fn strategy(&self) -> RunnerStrategy {
            RunnerStrategy::Rest
        }

        fn command(&self) -> &Arc<Command> {
            &self.command
        }

        fn server(&self) -> &Arc<dyn ServerEntity> {
            &self.server
        }

        async fn execute(&self) -> Result<Option<ResultValue>, CommandError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.behavior {
                MockBehavior::Text(s) => Ok(Some(ResultValue::Text(s.clone()))),
                MockBehavior::Fail(kind, msg) => Err(CommandError::new(*kind, msg.clone())),
                MockBehavior::Slow(delay, s) => {
                    tokio::time::sleep(*delay).await;
                    Ok(Some(ResultValue::Text(s.clone())))
                }
                MockBehavior::Panic(msg) => panic!("{}", msg),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_formats_at_boundary() {
        let err = CommandError::new(ErrorKind::CommandFailed, "Application already deployed");
        assert_eq!(err.to_string(), "command failed: Application already deployed");
        assert_eq!(CommandError::bare(ErrorKind::NoJavaVm).to_string(), "no usable JVM");
    }

    #[test]
    fn test_auth_kinds_map_to_auth_events() {
        assert!(ErrorKind::Auth.is_auth());
        assert!(ErrorKind::AuthHttp.is_auth());
        assert_eq!(ErrorKind::AuthHttp.event(), TaskEvent::AuthFailedHttp);
        assert!(!ErrorKind::Auth.is_retryable());
        assert!(ErrorKind::Transport.is_retryable());
    }
}
