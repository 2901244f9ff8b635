// Task state machine and lifecycle events

use serde::{Deserialize, Serialize};

/// Execution state of one command
///
/// READY -> RUNNING -> {COMPLETED, FAILED}. The two last states are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    Ready,
    Running,
    Completed,
    Failed,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Failed)
    }

    /// Check whether `self -> next` is a legal transition
    pub fn can_advance_to(self, next: TaskState) -> bool {
        matches!(
            (self, next),
            (TaskState::Ready, TaskState::Running)
                | (TaskState::Running, TaskState::Completed)
                | (TaskState::Running, TaskState::Failed)
        )
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskState::Ready => write!(f, "READY"),
            TaskState::Running => write!(f, "RUNNING"),
            TaskState::Completed => write!(f, "COMPLETED"),
            TaskState::Failed => write!(f, "FAILED"),
        }
    }
}

/// Event attached to every state notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskEvent {
    /// Task was handed to an executor
    Submit,
    /// Worker picked the task up
    Start,
    CmdCompleted,
    CmdFailed,
    /// Request target could not be built or an unexpected error occurred
    Exception,
    /// Login exception reported in the response payload
    AuthFailed,
    /// HTTP 401/403
    AuthFailedHttp,
    BadGateway,
    /// Connection refused or I/O failure after the retry budget
    TransportFailed,
    NoJavaVm,
    WrongJavaVm,
    JavaVmExecFailed,
    /// Artifact path missing or not readable
    InvalidPath,
    /// Response could not be interpreted
    EmptyMessage,
    IllegalState,
}

impl std::fmt::Display for TaskEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskEvent::Submit => "SUBMIT",
            TaskEvent::Start => "START",
            TaskEvent::CmdCompleted => "CMD_COMPLETED",
            TaskEvent::CmdFailed => "CMD_FAILED",
            TaskEvent::Exception => "EXCEPTION",
            TaskEvent::AuthFailed => "AUTH_FAILED",
            TaskEvent::AuthFailedHttp => "AUTH_FAILED_HTTP",
            TaskEvent::BadGateway => "BAD_GATEWAY",
            TaskEvent::TransportFailed => "TRANSPORT_FAILED",
            TaskEvent::NoJavaVm => "NO_JAVA_VM",
            TaskEvent::WrongJavaVm => "WRONG_JAVA_VM",
            TaskEvent::JavaVmExecFailed => "JAVA_VM_EXEC_FAILED",
            TaskEvent::InvalidPath => "INVALID_PATH",
            TaskEvent::EmptyMessage => "EMPTY_MESSAGE",
            TaskEvent::IllegalState => "ILLEGAL_STATE",
        };
        f.write_str(s)
    }
}
