// Admin client: configured execution context with every transport wired in

use crate::config::ClientConfig;
use crate::registry::build_registry;
use glassadmin_core::application::{Dispatcher, ExecutionContext, ParallelPool, TaskHandle};
use glassadmin_core::domain::{Command, CommandResult};
use glassadmin_core::port::{Authenticator, ServerEntity, SystemTimeProvider, TaskStateListener};
use glassadmin_core::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub struct AdminClient {
    context: ExecutionContext,
    pool: ParallelPool,
}

impl AdminClient {
    /// Build the registry, dispatcher and executors
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    /// `AdminError::Config` when a transport cannot be set up
    pub fn new(config: ClientConfig) -> Result<Self> {
        let registry = build_registry(&config)?;
        let dispatcher = Arc::new(Dispatcher::new(registry));
        let context = ExecutionContext::new(dispatcher, Arc::new(SystemTimeProvider));
        let pool = context.parallel_pool(config.parallel_pool_size);
        info!(
            version = glassadmin_core::VERSION,
            pool_size = config.parallel_pool_size,
            "Admin client ready"
        );
        Ok(Self { context, pool })
    }

    /// Listener notified for every task
    pub fn with_listener(mut self, listener: Arc<dyn TaskStateListener>) -> Self {
        self.context = self.context.with_listener(listener);
        self
    }

    /// # Errors
    /// `AdminError::InvalidState` when an authenticator is already installed
    pub fn install_authenticator(&self, authenticator: Arc<dyn Authenticator>) -> Result<()> {
        self.context.install_authenticator(authenticator)
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    /// Queue a command on the serial queue
    pub fn submit(&self, server: Arc<dyn ServerEntity>, command: Command) -> Result<TaskHandle> {
        self.context.exec(server, Arc::new(command), None)
    }

    /// Run a command on the parallel pool, outside the serial ordering
    pub fn submit_parallel(
        &self,
        server: Arc<dyn ServerEntity>,
        command: Command,
    ) -> Result<TaskHandle> {
        let runner = self.context.dispatcher().runner(server, Arc::new(command))?;
        Ok(self.context.submit_parallel(&self.pool, runner, None))
    }

    /// Submit and wait for the terminal result
    pub async fn exec(&self, server: Arc<dyn ServerEntity>, command: Command) -> Result<CommandResult> {
        self.submit(server, command)?.wait().await
    }

    /// Submit and wait at most `timeout`; the task keeps running past it
    pub async fn exec_timeout(
        &self,
        server: Arc<dyn ServerEntity>,
        command: Command,
        timeout: Duration,
    ) -> Result<CommandResult> {
        self.submit(server, command)?.wait_timeout(timeout).await
    }

    /// Drain the serial queue and stop its worker
    pub async fn shutdown(&self) {
        self.context.shutdown().await;
    }
}
