//! Dispatcher - selects and constructs the runner for a (server, command) pair
//!
//! Runner construction goes through an explicit registry filled at startup:
//! one factory per transport strategy. The dispatcher is the only validation
//! gate between a command and the transports, so an unknown version, unknown
//! interface or missing factory is rejected here before any I/O happens.

use crate::domain::{AdminInterface, Command, ServerVersion, Transport};
use crate::error::{AdminError, Result};
use crate::port::{Authenticator, Runner, RunnerStrategy, ServerEntity};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tracing::{debug, error};

/// Everything a factory needs to bind a runner
pub struct RunnerContext {
    pub server: Arc<dyn ServerEntity>,
    pub command: Arc<Command>,
    pub authenticator: Option<Arc<dyn Authenticator>>,
}

/// Runner constructor registered per strategy
pub type RunnerFactory = Arc<dyn Fn(RunnerContext) -> Result<Box<dyn Runner>> + Send + Sync>;

/// Static strategy -> factory table
#[derive(Default, Clone)]
pub struct RunnerRegistry {
    factories: HashMap<RunnerStrategy, RunnerFactory>,
}

impl RunnerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory, replacing any previous one for the strategy
    pub fn register<F>(mut self, strategy: RunnerStrategy, factory: F) -> Self
    where
        F: Fn(RunnerContext) -> Result<Box<dyn Runner>> + Send + Sync + 'static,
    {
        self.factories.insert(strategy, Arc::new(factory));
        self
    }

    pub fn contains(&self, strategy: RunnerStrategy) -> bool {
        self.factories.contains_key(&strategy)
    }

    fn get(&self, strategy: RunnerStrategy) -> Option<&RunnerFactory> {
        self.factories.get(&strategy)
    }
}

/// Map the command's transport declaration and the server interface to a strategy
pub fn strategy_for(transport: Transport, interface: Option<AdminInterface>) -> Result<RunnerStrategy> {
    match transport {
        Transport::LocalCli => Ok(RunnerStrategy::Asadmin),
        Transport::LocalJvm => Ok(RunnerStrategy::LocalJvm),
        Transport::Remote => match interface {
            Some(AdminInterface::Http) => Ok(RunnerStrategy::Http),
            Some(AdminInterface::Rest) => Ok(RunnerStrategy::Rest),
            None => Err(AdminError::Config(
                "server declares neither an admin interface nor a version".to_string(),
            )),
        },
    }
}

pub struct Dispatcher {
    registry: RunnerRegistry,
    authenticator: OnceLock<Arc<dyn Authenticator>>,
}

impl Dispatcher {
    pub fn new(registry: RunnerRegistry) -> Self {
        Self {
            registry,
            authenticator: OnceLock::new(),
        }
    }

    /// Install the challenge authenticator
    ///
    /// # Errors
    /// `AdminError::InvalidState` when one is already installed
    pub fn install_authenticator(&self, authenticator: Arc<dyn Authenticator>) -> Result<()> {
        self.authenticator
            .set(authenticator)
            .map_err(|_| AdminError::InvalidState("authenticator already installed".to_string()))
    }

    pub fn authenticator(&self) -> Option<Arc<dyn Authenticator>> {
        self.authenticator.get().cloned()
    }

    /// Resolve the interface from the server: explicit declaration first, then version
    pub fn resolve_interface(server: &dyn ServerEntity) -> Result<Option<AdminInterface>> {
        if let Some(interface) = server.admin_interface() {
            return Ok(Some(interface));
        }
        match server.version() {
            Some(version) => Ok(Some(version.admin_interface()?)),
            None => Ok(None),
        }
    }

    /// Runner for a command against a server
    pub fn runner(
        &self,
        server: Arc<dyn ServerEntity>,
        command: Arc<Command>,
    ) -> Result<Box<dyn Runner>> {
        let interface = match command.transport() {
            Transport::Remote => Self::resolve_interface(server.as_ref())?,
            _ => None,
        };
        let strategy = strategy_for(command.transport(), interface)?;
        self.build(strategy, server, command)
    }

    /// Runner for an explicitly selected administration interface
    pub fn runner_for_interface(
        &self,
        interface: AdminInterface,
        server: Arc<dyn ServerEntity>,
        command: Arc<Command>,
    ) -> Result<Box<dyn Runner>> {
        let strategy = strategy_for(command.transport(), Some(interface))?;
        self.build(strategy, server, command)
    }

    /// Runner for a server version mapped through the version table
    pub fn runner_for_version(
        &self,
        version: ServerVersion,
        server: Arc<dyn ServerEntity>,
        command: Arc<Command>,
    ) -> Result<Box<dyn Runner>> {
        let interface = version.admin_interface()?;
        self.runner_for_interface(interface, server, command)
    }

    fn build(
        &self,
        strategy: RunnerStrategy,
        server: Arc<dyn ServerEntity>,
        command: Arc<Command>,
    ) -> Result<Box<dyn Runner>> {
        let factory = self.registry.get(strategy).ok_or_else(|| {
            error!(strategy = %strategy, command = %command.name(), "No runner registered");
            AdminError::RunnerInit(format!(
                "no runner registered for strategy {} (command {})",
                strategy,
                command.name()
            ))
        })?;

        debug!(
            server = %server.name(),
            command = %command.name(),
            strategy = %strategy,
            "Binding runner"
        );

        let context = RunnerContext {
            server,
            command,
            authenticator: self.authenticator(),
        };
        factory(context).map_err(|e| match e {
            AdminError::RunnerInit(_) | AdminError::Config(_) => e,
            other => AdminError::RunnerInit(other.to_string()),
        })
    }
}
