// Local runner configuration

use std::path::PathBuf;
use std::time::Duration;

/// Upper bound for `java -version`
pub const DEFAULT_VERSION_TIMEOUT: Duration = Duration::from_secs(10);

/// Capacity of the launched server's output channel
pub const OUTPUT_CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, Clone)]
pub struct LocalConfig {
    /// Where credential files are written; defaults to the domain directory,
    /// then the system temp directory
    pub password_file_dir: Option<PathBuf>,
    pub version_timeout: Duration,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            password_file_dir: None,
            version_timeout: DEFAULT_VERSION_TIMEOUT,
        }
    }
}
