// Server Entity Port
// Read-only accessor for connection parameters, credentials and paths

use crate::domain::{AdminInterface, Scheme, ServerDescriptor, ServerVersion};
use std::path::{Path, PathBuf};

pub trait ServerEntity: Send + Sync {
    fn name(&self) -> &str;

    fn host(&self) -> &str;

    fn admin_port(&self) -> u16;

    fn admin_user(&self) -> &str;

    fn admin_password(&self) -> Option<&str>;

    fn master_password(&self) -> Option<&str> {
        None
    }

    /// Explicitly declared administration interface
    fn admin_interface(&self) -> Option<AdminInterface>;

    fn version(&self) -> Option<ServerVersion>;

    /// Forced scheme, `None` means detect
    fn admin_scheme(&self) -> Option<Scheme> {
        None
    }

    fn server_home(&self) -> Option<&Path>;

    fn domain_dir(&self) -> Option<PathBuf>;

    fn java_home(&self) -> Option<&Path>;

    /// Supported JDK major versions, empty accepts any
    fn supported_java(&self) -> &[u32];
}

impl ServerEntity for ServerDescriptor {
    fn name(&self) -> &str {
        &self.name
    }

    fn host(&self) -> &str {
        &self.host
    }

    fn admin_port(&self) -> u16 {
        self.admin_port
    }

    fn admin_user(&self) -> &str {
        &self.admin_user
    }

    fn admin_password(&self) -> Option<&str> {
        self.admin_password.as_deref()
    }

    fn master_password(&self) -> Option<&str> {
        self.master_password.as_deref()
    }

    fn admin_interface(&self) -> Option<AdminInterface> {
        self.admin_interface
    }

    fn version(&self) -> Option<ServerVersion> {
        self.version
    }

    fn admin_scheme(&self) -> Option<Scheme> {
        self.admin_scheme
    }

    fn server_home(&self) -> Option<&Path> {
        self.server_home.as_deref()
    }

    fn domain_dir(&self) -> Option<PathBuf> {
        ServerDescriptor::domain_dir(self)
    }

    fn java_home(&self) -> Option<&Path> {
        self.java_home.as_deref()
    }

    fn supported_java(&self) -> &[u32] {
        &self.supported_java
    }
}
