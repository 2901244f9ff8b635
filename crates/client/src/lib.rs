//! Glassadmin composition root
//!
//! Wires the HTTP, REST, CLI-tool and JVM-bootstrap runners into one
//! dispatcher and execution context.

pub mod client;
pub mod config;
pub mod logging;
pub mod registry;

pub use client::AdminClient;
pub use config::ClientConfig;
pub use logging::{init_logging, LoggingListener};
pub use registry::build_registry;
