// Retry policy for transient transport failures
use crate::port::CommandError;
use std::time::Duration;
use tracing::{info, warn};

/// Default extra attempts after the first one
pub const DEFAULT_RETRIES: u32 = 1;

/// Default delay before a retry
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Retry decision result
#[derive(Debug, PartialEq, Eq)]
pub enum RetryDecision {
    /// Try again after the delay
    Retry(Duration),
    /// Give up, the error is final
    Failed,
}

/// Bounded retry budget
///
/// Only transport errors are retried. Authentication failures, protocol
/// errors and server-reported failures end the exchange immediately.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    retries: u32,
    delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_RETRIES, DEFAULT_RETRY_DELAY)
    }
}

impl RetryPolicy {
    /// Create a new retry policy
    ///
    /// # Arguments
    /// * `retries` - Extra attempts allowed after the first
    /// * `delay` - Pause before each extra attempt
    pub fn new(retries: u32, delay: Duration) -> Self {
        Self { retries, delay }
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Decide whether attempt number `attempt` (1-based) may be followed by another
    pub fn should_retry(&self, attempt: u32, err: &CommandError) -> RetryDecision {
        if !err.kind.is_retryable() {
            return RetryDecision::Failed;
        }
        if attempt > self.retries {
            warn!(
                attempt = %attempt,
                retries = %self.retries,
                error = %err,
                "Retry budget exhausted"
            );
            return RetryDecision::Failed;
        }
        info!(attempt = %attempt, delay_ms = %self.delay.as_millis(), error = %err, "Scheduling retry");
        RetryDecision::Retry(self.delay)
    }
}
