// Runner registry wiring: one factory per transport strategy

use crate::config::ClientConfig;
use glassadmin_core::application::RunnerRegistry;
use glassadmin_core::port::RunnerStrategy;
use glassadmin_core::Result;
use glassadmin_infra_http::{http_factory, rest_factory, shared_exchange};
use glassadmin_infra_system::{asadmin_factory, local_jvm_factory};

/// Registry covering every strategy
///
/// # Errors
/// `AdminError::Config` when the HTTP client cannot be built
pub fn build_registry(config: &ClientConfig) -> Result<RunnerRegistry> {
    let exchange = shared_exchange(config.http.clone())?;
    Ok(RunnerRegistry::new()
        .register(
            RunnerStrategy::Http,
            http_factory(exchange.with_authenticator(None)),
        )
        .register(RunnerStrategy::Rest, rest_factory(exchange))
        .register(
            RunnerStrategy::Asadmin,
            asadmin_factory(config.local.clone()),
        )
        .register(
            RunnerStrategy::LocalJvm,
            local_jvm_factory(config.local.clone()),
        ))
}
