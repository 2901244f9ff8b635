// Client configuration from GLASSADMIN_* environment variables

use glassadmin_core::application::retry::DEFAULT_RETRY_DELAY;
use glassadmin_core::application::RetryPolicy;
use glassadmin_infra_http::HttpConfig;
use glassadmin_infra_system::LocalConfig;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

pub const ENV_HTTP_RETRIES: &str = "GLASSADMIN_HTTP_RETRIES";
pub const ENV_CONNECT_TIMEOUT_MS: &str = "GLASSADMIN_CONNECT_TIMEOUT_MS";
pub const ENV_READ_TIMEOUT_MS: &str = "GLASSADMIN_READ_TIMEOUT_MS";
pub const ENV_TRUST_ALL_CERTS: &str = "GLASSADMIN_TRUST_ALL_CERTS";
pub const ENV_PARALLEL_POOL_SIZE: &str = "GLASSADMIN_PARALLEL_POOL_SIZE";
pub const ENV_PASSWORD_FILE_DIR: &str = "GLASSADMIN_PASSWORD_FILE_DIR";

pub const DEFAULT_PARALLEL_POOL_SIZE: usize = 4;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub http: HttpConfig,
    pub local: LocalConfig,
    pub parallel_pool_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            local: LocalConfig::default(),
            parallel_pool_size: DEFAULT_PARALLEL_POOL_SIZE,
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns; unparsable values
    /// are logged and ignored
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(retries) = parse::<u32>(&lookup, ENV_HTTP_RETRIES) {
            config.http.retry = RetryPolicy::new(retries, DEFAULT_RETRY_DELAY);
        }
        if let Some(ms) = parse::<u64>(&lookup, ENV_CONNECT_TIMEOUT_MS) {
            config.http.connect_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = parse::<u64>(&lookup, ENV_READ_TIMEOUT_MS) {
            config.http.read_timeout = Duration::from_millis(ms);
        }
        if let Some(trust) = parse::<bool>(&lookup, ENV_TRUST_ALL_CERTS) {
            config.http.trust_all_certs = trust;
        }
        if let Some(size) = parse::<usize>(&lookup, ENV_PARALLEL_POOL_SIZE) {
            config.parallel_pool_size = size.max(1);
        }
        if let Some(dir) = lookup(ENV_PASSWORD_FILE_DIR).filter(|d| !d.is_empty()) {
            config.local.password_file_dir = Some(PathBuf::from(shellexpand::tilde(&dir).into_owned()));
        }

        config
    }
}

fn parse<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key = %key, value = %raw, "Ignoring unparsable setting");
            None
        }
    }
}
