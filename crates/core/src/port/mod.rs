// Port Layer - Interfaces for external collaborators

pub mod authenticator;
pub mod listener;
pub mod report_decoder;
pub mod runner;
pub mod server_entity;
pub mod time_provider;

// Re-exports
pub use authenticator::{Authenticator, Credentials, StaticAuthenticator};
pub use listener::TaskStateListener;
pub use report_decoder::ReportDecoder;
pub use runner::{CommandError, ErrorKind, Runner, RunnerStrategy};
pub use server_entity::ServerEntity;
pub use time_provider::{SystemTimeProvider, TimeProvider};
