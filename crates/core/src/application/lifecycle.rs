// Runner lifecycle - shared state machine around every transport
//
// READY is set when a task is scheduled, RUNNING when a worker picks it up,
// COMPLETED/FAILED once the runner returns. Every transition is reported to
// the listeners as (state, event, [server, command, message?]).

use crate::domain::{CommandResult, ResultValue, TaskEvent, TaskState};
use crate::port::{CommandError, ErrorKind, Runner, TaskStateListener, TimeProvider};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Owns the result of one task and fans out its transitions
pub struct TaskTracker {
    server: String,
    result: CommandResult,
    listeners: Vec<Arc<dyn TaskStateListener>>,
}

impl TaskTracker {
    /// Create a tracker in READY state
    pub fn new(
        server: impl Into<String>,
        command: impl Into<String>,
        listeners: Vec<Arc<dyn TaskStateListener>>,
    ) -> Self {
        Self {
            server: server.into(),
            result: CommandResult::new(command),
            listeners,
        }
    }

    pub fn state(&self) -> TaskState {
        self.result.state()
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn listeners(&self) -> &[Arc<dyn TaskStateListener>] {
        &self.listeners
    }

    /// FAILED result for a task whose runner died after RUNNING was announced
    pub fn runner_died(
        server: impl Into<String>,
        command: impl Into<String>,
        listeners: Vec<Arc<dyn TaskStateListener>>,
        message: impl Into<String>,
    ) -> CommandResult {
        let mut tracker = Self::new(server, command, listeners);
        let message = message.into();
        if let Err(e) = tracker.result.advance(TaskState::Running) {
            error!(error = %e, "Illegal task transition");
        }
        tracker.result.set_message(Some(message.clone()));
        if let Err(e) = tracker.result.advance(TaskState::Failed) {
            error!(error = %e, "Illegal task transition");
        }
        tracker.notify(TaskState::Failed, TaskEvent::Exception, Some(message));
        tracker.into_result()
    }

    /// Announce READY to listeners
    pub fn submitted(&self) {
        self.notify(TaskState::Ready, TaskEvent::Submit, None);
    }

    pub fn start(&mut self) -> crate::domain::error::Result<()> {
        self.result.advance(TaskState::Running)?;
        self.notify(TaskState::Running, TaskEvent::Start, None);
        Ok(())
    }

    pub fn complete(
        &mut self,
        value: Option<ResultValue>,
        retry: bool,
    ) -> crate::domain::error::Result<()> {
        if let Some(value) = value {
            self.result.set_value(value)?;
        }
        if retry {
            self.result.mark_retry();
        }
        self.result.advance(TaskState::Completed)?;
        self.notify(TaskState::Completed, TaskEvent::CmdCompleted, None);
        Ok(())
    }

    pub fn fail(&mut self, err: &CommandError, retry: bool) -> crate::domain::error::Result<()> {
        if err.kind.is_auth() {
            self.result.mark_auth_failed();
        }
        if retry {
            self.result.mark_retry();
        }
        let message = err.to_string();
        self.result.set_message(Some(message.clone()));
        self.result.advance(TaskState::Failed)?;
        self.notify(TaskState::Failed, err.kind.event(), Some(message));
        Ok(())
    }

    pub fn into_result(self) -> CommandResult {
        self.result
    }

    fn notify(&self, state: TaskState, event: TaskEvent, message: Option<String>) {
        let mut args = vec![self.server.clone(), self.result.command().to_string()];
        if let Some(message) = message {
            args.push(message);
        }
        debug!(
            server = %self.server,
            command = %self.result.command(),
            state = %state,
            event = %event,
            "Task state change"
        );
        for listener in &self.listeners {
            listener.on_state_change(state, event, &args);
        }
    }
}

/// Check preconditions that hold for every transport
fn check_preconditions(runner: &dyn Runner) -> Result<(), CommandError> {
    if let Some(path) = runner.command().upload() {
        if !path.is_file() {
            return Err(CommandError::new(
                ErrorKind::InvalidPath,
                format!("artifact not found: {}", path.display()),
            ));
        }
    }
    Ok(())
}

/// Drive one runner through RUNNING to a terminal state
///
/// Never fails: every error ends in a FAILED result.
pub async fn run_task(
    runner: Box<dyn Runner>,
    mut tracker: TaskTracker,
    time_provider: Arc<dyn TimeProvider>,
) -> CommandResult {
    let command = Arc::clone(runner.command());
    let server = runner.server().name().to_string();

    if let Err(e) = tracker.start() {
        error!(server = %server, command = %command.name(), error = %e, "Task not startable");
        return tracker.into_result();
    }

    let start = time_provider.now_millis();
    info!(
        server = %server,
        command = %command.name(),
        strategy = %runner.strategy(),
        "Executing command"
    );

    let outcome = match check_preconditions(runner.as_ref()) {
        Ok(()) => runner.execute().await,
        Err(e) => Err(e),
    };
    let duration_ms = time_provider.elapsed_since(start);

    let transition = match outcome {
        Ok(value) => {
            info!(
                server = %server,
                command = %command.name(),
                duration_ms = %duration_ms,
                "Command completed"
            );
            tracker.complete(value, command.is_retry())
        }
        Err(err) => {
            warn!(
                server = %server,
                command = %command.name(),
                duration_ms = %duration_ms,
                kind = ?err.kind,
                error = %err,
                "Command failed"
            );
            tracker.fail(&err, command.is_retry())
        }
    };
    if let Err(e) = transition {
        error!(server = %server, command = %command.name(), error = %e, "Illegal task transition");
    }

    tracker.into_result()
}
