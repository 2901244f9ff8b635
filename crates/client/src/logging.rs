//! Logging setup
//!
//! `RUST_LOG` selects the filter (default `glassadmin=info`),
//! `GLASSADMIN_LOG_FORMAT=json` switches to JSON lines for log shippers.

use anyhow::{anyhow, Result};
use glassadmin_core::domain::{TaskEvent, TaskState};
use glassadmin_core::port::TaskStateListener;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const ENV_LOG_FORMAT: &str = "GLASSADMIN_LOG_FORMAT";
const DEFAULT_FILTER: &str = "glassadmin=info";

/// Install the global subscriber, writing to stderr
///
/// # Errors
/// When the filter is invalid or a subscriber is already installed
pub fn init_logging() -> Result<()> {
    let format = std::env::var(ENV_LOG_FORMAT).unwrap_or_else(|_| "pretty".to_string());
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))
        .map_err(|e| anyhow!("invalid log filter: {e}"))?;

    let registry = tracing_subscriber::registry().with(env_filter);
    let installed = match format.as_str() {
        "json" => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        _ => registry
            .with(fmt::layer().pretty().with_writer(std::io::stderr))
            .try_init(),
    };
    installed.map_err(|e| anyhow!("logging already initialized: {e}"))
}

/// Listener writing every task transition to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingListener;

impl TaskStateListener for LoggingListener {
    fn on_state_change(&self, state: TaskState, event: TaskEvent, args: &[String]) {
        let server = args.first().map(String::as_str).unwrap_or_default();
        let command = args.get(1).map(String::as_str).unwrap_or_default();
        match (state, args.get(2)) {
            (TaskState::Failed, Some(message)) => {
                warn!(server = %server, command = %command, event = %event, message = %message, "Task failed")
            }
            _ => info!(server = %server, command = %command, state = %state, event = %event, "Task state"),
        }
    }
}
