// Execution context - explicit replacement for shared executors and a
// process-wide authenticator. Constructed once, passed to callers, shut down
// explicitly.

use crate::application::dispatcher::Dispatcher;
use crate::application::executor::{ParallelPool, SerialQueue, TaskHandle};
use crate::domain::Command;
use crate::error::Result;
use crate::port::{Authenticator, Runner, ServerEntity, TaskStateListener, TimeProvider};
use std::sync::Arc;
use tracing::info;

pub struct ExecutionContext {
    dispatcher: Arc<Dispatcher>,
    serial: SerialQueue,
    time_provider: Arc<dyn TimeProvider>,
    listeners: Vec<Arc<dyn TaskStateListener>>,
}

impl ExecutionContext {
    /// Create the context and start its serial worker
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(dispatcher: Arc<Dispatcher>, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            dispatcher,
            serial: SerialQueue::start(Arc::clone(&time_provider)),
            time_provider,
            listeners: Vec::new(),
        }
    }

    /// Listener notified for every task submitted through this context
    pub fn with_listener(mut self, listener: Arc<dyn TaskStateListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Install the challenge authenticator, allowed once
    pub fn install_authenticator(&self, authenticator: Arc<dyn Authenticator>) -> Result<()> {
        self.dispatcher.install_authenticator(authenticator)
    }

    /// Build a parallel pool sharing this context's clock
    pub fn parallel_pool(&self, size: usize) -> ParallelPool {
        ParallelPool::new(size, Arc::clone(&self.time_provider))
    }

    /// Queue a bound runner on the serial queue
    pub fn submit(
        &self,
        runner: Box<dyn Runner>,
        extra: Option<Arc<dyn TaskStateListener>>,
    ) -> Result<TaskHandle> {
        self.serial.submit(runner, self.listeners_with(extra))
    }

    /// Queue a bound runner on a caller-provided parallel pool
    pub fn submit_parallel(
        &self,
        pool: &ParallelPool,
        runner: Box<dyn Runner>,
        extra: Option<Arc<dyn TaskStateListener>>,
    ) -> TaskHandle {
        pool.submit(runner, self.listeners_with(extra))
    }

    /// Dispatch and queue in one call
    ///
    /// # Errors
    /// Configuration and runner construction errors, before anything is queued
    pub fn exec(
        &self,
        server: Arc<dyn ServerEntity>,
        command: Arc<Command>,
        extra: Option<Arc<dyn TaskStateListener>>,
    ) -> Result<TaskHandle> {
        let runner = self.dispatcher.runner(server, command)?;
        self.submit(runner, extra)
    }

    /// Drain the serial queue and stop its worker
    pub async fn shutdown(&self) {
        info!("Shutting down execution context");
        self.serial.shutdown().await;
    }

    fn listeners_with(
        &self,
        extra: Option<Arc<dyn TaskStateListener>>,
    ) -> Vec<Arc<dyn TaskStateListener>> {
        let mut listeners = self.listeners.clone();
        listeners.extend(extra);
        listeners
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dispatcher::{RunnerContext, RunnerRegistry};
    use crate::domain::{AdminInterface, ServerDescriptor, TaskEvent, TaskState};
    use crate::port::listener::mocks::RecordingListener;
    use crate::port::runner::mocks::{MockBehavior, MockRunner};
    use crate::port::{RunnerStrategy, SystemTimeProvider};

    fn context() -> ExecutionContext {
        let registry = RunnerRegistry::new().register(RunnerStrategy::Rest, |ctx: RunnerContext| {
            Ok(Box::new(MockRunner::new(
                ctx.server,
                ctx.command,
                MockBehavior::Text("Payara 5.192".into()),
            )) as Box<dyn Runner>)
        });
        ExecutionContext::new(
            Arc::new(Dispatcher::new(registry)),
            Arc::new(SystemTimeProvider),
        )
    }

    #[tokio::test]
    async fn test_exec_notifies_context_and_extra_listeners() {
        let global = Arc::new(RecordingListener::new());
        let extra = Arc::new(RecordingListener::new());
        let ctx = context().with_listener(global.clone());

        let mut server = ServerDescriptor::new("payara", "localhost", 4848);
        server.admin_interface = Some(AdminInterface::Rest);

        let handle = ctx
            .exec(
                Arc::new(server),
                Arc::new(Command::new("version")),
                Some(extra.clone()),
            )
            .unwrap();
        let result = handle.wait().await.unwrap();

        assert_eq!(result.value().and_then(|v| v.as_text()), Some("Payara 5.192"));
        for listener in [&global, &extra] {
            assert_eq!(
                listener.states(),
                vec![TaskState::Ready, TaskState::Running, TaskState::Completed]
            );
        }
        assert_eq!(extra.notifications()[0].event, TaskEvent::Submit);
        ctx.shutdown().await;
    }

    #[tokio::test]
    async fn test_exec_rejects_unresolvable_server() {
        let ctx = context();
        let server = ServerDescriptor::new("payara", "localhost", 4848);
        let result = ctx.exec(Arc::new(server), Arc::new(Command::new("version")), None);
        assert!(result.is_err());
    }
}
