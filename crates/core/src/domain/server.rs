// Server model: version, administration interface, descriptor

use crate::domain::error::{DomainError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// First major version served over the REST interface
pub const REST_SINCE_MAJOR: u32 = 4;

/// Oldest supported major version
pub const MIN_SUPPORTED_MAJOR: u32 = 3;

/// Administration interface a server exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdminInterface {
    Http,
    Rest,
}

impl std::fmt::Display for AdminInterface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdminInterface::Http => write!(f, "HTTP"),
            AdminInterface::Rest => write!(f, "REST"),
        }
    }
}

/// URL scheme for the admin endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

/// Server version (major.minor.update.build)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ServerVersion {
    pub major: u32,
    pub minor: u32,
    pub update: u32,
    pub build: u32,
}

impl ServerVersion {
    pub fn new(major: u32, minor: u32, update: u32, build: u32) -> Self {
        Self {
            major,
            minor,
            update,
            build,
        }
    }

    /// Parse `5`, `5.192`, `4.1.2.181`; missing parts default to zero
    pub fn parse(s: &str) -> Result<Self> {
        let mut parts = [0u32; 4];
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(DomainError::ValidationError("empty version".to_string()));
        }
        for (i, part) in trimmed.split('.').enumerate() {
            if i >= parts.len() {
                return Err(DomainError::ValidationError(format!("too many components: {s}")));
            }
            parts[i] = part
                .parse()
                .map_err(|_| DomainError::ValidationError(format!("invalid version: {s}")))?;
        }
        Ok(Self::new(parts[0], parts[1], parts[2], parts[3]))
    }

    /// Fixed version -> interface table
    pub fn admin_interface(&self) -> Result<AdminInterface> {
        if self.major < MIN_SUPPORTED_MAJOR {
            return Err(DomainError::UnsupportedVersion(self.to_string()));
        }
        if self.major < REST_SINCE_MAJOR {
            Ok(AdminInterface::Http)
        } else {
            Ok(AdminInterface::Rest)
        }
    }
}

impl std::fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}.{}", self.major, self.minor, self.update, self.build)
    }
}

/// Plain server description, deserializable from configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerDescriptor {
    pub name: String,
    pub host: String,
    pub admin_port: u16,
    #[serde(default = "default_admin_user")]
    pub admin_user: String,
    #[serde(default)]
    pub admin_password: Option<String>,
    #[serde(default)]
    pub master_password: Option<String>,
    #[serde(default)]
    pub admin_interface: Option<AdminInterface>,
    #[serde(default)]
    pub version: Option<ServerVersion>,
    /// Forces the admin scheme instead of probing
    #[serde(default)]
    pub admin_scheme: Option<Scheme>,
    #[serde(default)]
    pub server_home: Option<PathBuf>,
    #[serde(default)]
    pub domains_folder: Option<PathBuf>,
    #[serde(default)]
    pub domain_name: Option<String>,
    #[serde(default)]
    pub java_home: Option<PathBuf>,
    /// Supported JDK major versions, empty accepts any
    #[serde(default)]
    pub supported_java: Vec<u32>,
}

fn default_admin_user() -> String {
    "admin".to_string()
}

impl ServerDescriptor {
    pub fn new(name: impl Into<String>, host: impl Into<String>, admin_port: u16) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            admin_port,
            admin_user: default_admin_user(),
            admin_password: None,
            master_password: None,
            admin_interface: None,
            version: None,
            admin_scheme: None,
            server_home: None,
            domains_folder: None,
            domain_name: None,
            java_home: None,
            supported_java: Vec::new(),
        }
    }

    /// Domain directory, when both folder and name are known
    pub fn domain_dir(&self) -> Option<PathBuf> {
        match (&self.domains_folder, &self.domain_name) {
            (Some(folder), Some(name)) => Some(folder.join(name)),
            _ => None,
        }
    }
}
