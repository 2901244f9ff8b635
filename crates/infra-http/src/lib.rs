//! HTTP admin transports
//!
//! The legacy query-string interface (`/__asadmin/<command>`, manifest answers)
//! and the REST interface (`/command/<command>`, JSON reports) share one
//! exchange that handles scheme probing, credentials, redirects and retries.

pub mod config;
pub mod exchange;
pub mod http_runner;
pub mod json_report;
pub mod manifest;
pub mod query;
pub mod rest_runner;
pub mod scheme;
pub mod upload;

pub use config::HttpConfig;
pub use exchange::{HttpExchange, HttpReply};
pub use http_runner::HttpRunner;
pub use json_report::JsonReportDecoder;
pub use manifest::ManifestDecoder;
pub use rest_runner::RestRunner;

use glassadmin_core::application::RunnerContext;
use glassadmin_core::port::Runner;
use glassadmin_core::{AdminError, Result};

/// Shared exchange for both factories
///
/// # Errors
/// `AdminError::Config` when the HTTP client cannot be built
pub fn shared_exchange(config: HttpConfig) -> Result<HttpExchange> {
    HttpExchange::new(config, None).map_err(|e| AdminError::Config(e.to_string()))
}

/// Registry factory for the legacy HTTP strategy
pub fn http_factory(
    exchange: HttpExchange,
) -> impl Fn(RunnerContext) -> Result<Box<dyn Runner>> + Send + Sync + 'static {
    move |ctx: RunnerContext| {
        let exchange = exchange.with_authenticator(ctx.authenticator);
        Ok(Box::new(HttpRunner::new(ctx.server, ctx.command, exchange)) as Box<dyn Runner>)
    }
}

/// Registry factory for the REST strategy
pub fn rest_factory(
    exchange: HttpExchange,
) -> impl Fn(RunnerContext) -> Result<Box<dyn Runner>> + Send + Sync + 'static {
    move |ctx: RunnerContext| {
        let exchange = exchange.with_authenticator(ctx.authenticator);
        Ok(Box::new(RestRunner::new(ctx.server, ctx.command, exchange)) as Box<dyn Runner>)
    }
}
