// Task State Listener Port

use crate::domain::{TaskEvent, TaskState};

/// Receives every state transition of a task
///
/// `args` is positional: server name, command name, then the failure message
/// when one exists.
pub trait TaskStateListener: Send + Sync {
    fn on_state_change(&self, state: TaskState, event: TaskEvent, args: &[String]);
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::Mutex;

    /// One recorded notification
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Notification {
        pub state: TaskState,
        pub event: TaskEvent,
        pub args: Vec<String>,
    }

    /// Listener that records every notification in order
    #[derive(Default)]
    pub struct RecordingListener {
        seen: Mutex<Vec<Notification>>,
    }

    impl RecordingListener {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn notifications(&self) -> Vec<Notification> {
            self.seen.lock().unwrap().clone()
        }

        pub fn states(&self) -> Vec<TaskState> {
            self.seen.lock().unwrap().iter().map(|n| n.state).collect()
        }
    }

    impl TaskStateListener for RecordingListener {
        fn on_state_change(&self, state: TaskState, event: TaskEvent, args: &[String]) {
            self.seen.lock().unwrap().push(Notification {
                state,
                event,
                args: args.to_vec(),
            });
        }
    }
}
