// Credential file consumed by the CLI tool through --passwordfile
//
// One KEY=VALUE line per entry. Owner read-write while written, owner
// read-only once finalized. Removing the file is left to the caller.

use glassadmin_core::port::{CommandError, ErrorKind, ServerEntity};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const ADMIN_PASSWORD_KEY: &str = "AS_ADMIN_PASSWORD";
pub const MASTER_PASSWORD_KEY: &str = "AS_ADMIN_MASTERPASSWORD";
pub const NEW_PASSWORD_KEY: &str = "AS_ADMIN_NEWPASSWORD";

const FILE_SUFFIX: &str = ".passwordfile";

#[derive(Default, Clone, PartialEq, Eq)]
pub struct PasswordEntries {
    pub admin: String,
    pub master: Option<String>,
    pub new_password: Option<String>,
}

impl std::fmt::Debug for PasswordEntries {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordEntries")
            .field("master", &self.master.is_some())
            .field("new_password", &self.new_password.is_some())
            .finish()
    }
}

impl PasswordEntries {
    pub fn for_server(server: &dyn ServerEntity) -> Self {
        Self {
            admin: server.admin_password().unwrap_or_default().to_string(),
            master: server.master_password().map(str::to_string),
            new_password: None,
        }
    }

    pub fn with_new_password(mut self, password: impl Into<String>) -> Self {
        self.new_password = Some(password.into());
        self
    }

    pub fn render(&self) -> String {
        let mut out = format!("{ADMIN_PASSWORD_KEY}={}\n", self.admin);
        if let Some(master) = &self.master {
            out.push_str(&format!("{MASTER_PASSWORD_KEY}={master}\n"));
        }
        if let Some(new_password) = &self.new_password {
            out.push_str(&format!("{NEW_PASSWORD_KEY}={new_password}\n"));
        }
        out
    }
}

/// Location of a server's credential file
pub fn password_file_path(dir: Option<&Path>, server: &dyn ServerEntity) -> PathBuf {
    let dir = dir
        .map(Path::to_path_buf)
        .or_else(|| server.domain_dir())
        .unwrap_or_else(std::env::temp_dir);
    let name: String = server
        .name()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    dir.join(format!("{name}{FILE_SUFFIX}"))
}

/// Write `entries` to `path`, replacing any previous content
///
/// The content is staged in a fresh owner-only file next to `path` and
/// renamed over it, so an existing symlink at `path` is never followed.
///
/// # Errors
/// `ErrorKind::InvalidPath` when `path` is a symlink or the file cannot be
/// staged or finalized
pub async fn write_password_file(path: &Path, entries: &PasswordEntries) -> Result<(), CommandError> {
    let io_err = |e: std::io::Error| {
        CommandError::new(ErrorKind::InvalidPath, format!("{}: {e}", path.display()))
    };

    match tokio::fs::symlink_metadata(path).await {
        Ok(meta) if meta.file_type().is_symlink() => {
            warn!(path = %path.display(), "Refusing to write credentials through a symlink");
            return Err(CommandError::new(
                ErrorKind::InvalidPath,
                format!("{} is a symlink", path.display()),
            ));
        }
        // A finalized file from an earlier run is read-only
        Ok(_) => set_mode(path, Mode::Staging).map_err(io_err)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(io_err(e)),
    }

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    tokio::fs::create_dir_all(&dir).await.map_err(io_err)?;

    let target = path.to_path_buf();
    let content = entries.render();
    tokio::task::spawn_blocking(move || stage_and_persist(&dir, &target, content.as_bytes()))
        .await
        .map_err(|e| CommandError::new(ErrorKind::InvalidPath, e.to_string()))?
        .map_err(io_err)?;

    debug!(path = %path.display(), "Credential file written");
    Ok(())
}

fn stage_and_persist(dir: &Path, target: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut staged = tempfile::Builder::new()
        .prefix(".glassadmin-")
        .suffix(FILE_SUFFIX)
        .tempfile_in(dir)?;
    set_mode(staged.path(), Mode::Staging)?;
    staged.write_all(content)?;
    staged.as_file().sync_all()?;
    set_mode(staged.path(), Mode::Final)?;
    staged.persist(target).map_err(|e| e.error)?;
    Ok(())
}

#[derive(Clone, Copy)]
enum Mode {
    Staging,
    Final,
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: Mode) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let bits = match mode {
        Mode::Staging => 0o600,
        Mode::Final => 0o400,
    };
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(bits))
}

#[cfg(not(unix))]
fn set_mode(path: &Path, mode: Mode) -> std::io::Result<()> {
    let mut permissions = std::fs::metadata(path)?.permissions();
    permissions.set_readonly(matches!(mode, Mode::Final));
    std::fs::set_permissions(path, permissions)
}
