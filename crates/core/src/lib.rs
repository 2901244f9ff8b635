// Glassadmin Core - Command model, runner contract & execution framework
// NO transport dependencies: HTTP and process runners live in infra crates

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use error::{AdminError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
