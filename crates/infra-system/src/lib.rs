//! Local process transports
//!
//! The admin CLI tool driven through the process-IO parser, and direct JVM
//! bootstrap of the server. Both verify the local JDK before spawning anything.

pub mod asadmin_runner;
pub mod config;
pub mod jdk;
pub mod local_runner;
pub mod password_file;

pub use asadmin_runner::AsadminRunner;
pub use config::LocalConfig;
pub use local_runner::LocalJvmRunner;

use glassadmin_core::application::RunnerContext;
use glassadmin_core::port::Runner;
use glassadmin_core::Result;

/// Registry factory for the CLI tool strategy
pub fn asadmin_factory(
    config: LocalConfig,
) -> impl Fn(RunnerContext) -> Result<Box<dyn Runner>> + Send + Sync + 'static {
    move |ctx: RunnerContext| {
        Ok(Box::new(AsadminRunner::new(ctx.server, ctx.command, config.clone())) as Box<dyn Runner>)
    }
}

/// Registry factory for the JVM bootstrap strategy
pub fn local_jvm_factory(
    config: LocalConfig,
) -> impl Fn(RunnerContext) -> Result<Box<dyn Runner>> + Send + Sync + 'static {
    move |ctx: RunnerContext| {
        Ok(Box::new(LocalJvmRunner::new(ctx.server, ctx.command, config.clone())) as Box<dyn Runner>)
    }
}
