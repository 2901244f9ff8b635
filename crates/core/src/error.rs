// Central Error Type for the Application

use thiserror::Error;

/// Application-level error type
///
/// Raised synchronously by the dispatcher and executors. Failures of a
/// running command never use this type, they end in a FAILED result.
#[derive(Error, Debug)]
pub enum AdminError {
    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Runner initialization failed: {0}")]
    RunnerInit(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Timed out after {0}ms waiting for command result")]
    Timeout(u64),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using AdminError
pub type Result<T> = std::result::Result<T, AdminError>;
