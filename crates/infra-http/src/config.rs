// HTTP transport configuration

use glassadmin_core::application::RetryPolicy;
use std::time::Duration;

/// Default connect timeout (10s)
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default whole-request timeout (3 minutes, deploys can be slow)
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(180);

/// Timeout for the secure-scheme detection
pub const DEFAULT_DETECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Settings shared by the legacy HTTP and REST runners
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub retry: RetryPolicy,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub detect_timeout: Duration,
    /// Accept self-signed admin certificates
    pub trust_all_certs: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            detect_timeout: DEFAULT_DETECT_TIMEOUT,
            trust_all_certs: true,
        }
    }
}
