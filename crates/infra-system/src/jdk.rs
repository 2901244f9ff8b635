// JDK discovery and platform check shared by both local runners

use glassadmin_core::domain::Command;
use glassadmin_core::port::{CommandError, ErrorKind, ServerEntity};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

#[cfg(windows)]
const JAVA_BINARY: &str = "java.exe";
#[cfg(not(windows))]
const JAVA_BINARY: &str = "java";

/// A verified local JDK
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JavaInstallation {
    pub home: PathBuf,
    pub executable: PathBuf,
    pub major: u32,
}

/// JDK home for a command: the command's own, then the server's, then `JAVA_HOME`
pub fn java_home(command: &Command, server: &dyn ServerEntity) -> Option<PathBuf> {
    command
        .java_home()
        .or_else(|| server.java_home())
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os("JAVA_HOME").map(PathBuf::from))
}

/// Major version from a `java -version` banner
///
/// Handles both `1.8.0_292` and `17.0.2` numbering.
pub fn parse_major(banner: &str) -> Option<u32> {
    let start = banner.find('"')? + 1;
    let end = start + banner[start..].find('"')?;
    let version = &banner[start..end];
    let mut parts = version.split(|c: char| !c.is_ascii_digit());
    let first: u32 = parts.next()?.parse().ok()?;
    if first == 1 {
        parts.next()?.parse().ok()
    } else {
        Some(first)
    }
}

/// Run `java -version` and read the major version
async fn detect_major(executable: &Path, limit: Duration) -> Result<u32, CommandError> {
    let output = tokio::process::Command::new(executable)
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output();
    let output = timeout(limit, output)
        .await
        .map_err(|_| {
            CommandError::new(
                ErrorKind::NoJavaVm,
                format!("{} -version timed out", executable.display()),
            )
        })?
        .map_err(|e| CommandError::new(ErrorKind::NoJavaVm, format!("{}: {e}", executable.display())))?;

    // The banner goes to stderr, some builds print it on stdout
    let banner = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stderr),
        String::from_utf8_lossy(&output.stdout)
    );
    parse_major(&banner).ok_or_else(|| {
        CommandError::new(
            ErrorKind::NoJavaVm,
            format!("unrecognized java -version output from {}", executable.display()),
        )
    })
}

/// Resolve the JDK for a command and check it against the server's supported set
///
/// # Errors
/// * `ErrorKind::NoJavaVm` - no home, no executable, or unreadable version
/// * `ErrorKind::WrongJavaVm` - version outside the supported set
pub async fn verify(
    command: &Command,
    server: &dyn ServerEntity,
    version_timeout: Duration,
) -> Result<JavaInstallation, CommandError> {
    let home = java_home(command, server)
        .ok_or_else(|| CommandError::new(ErrorKind::NoJavaVm, "no Java home configured"))?;
    let executable = home.join("bin").join(JAVA_BINARY);
    if !executable.is_file() {
        return Err(CommandError::new(
            ErrorKind::NoJavaVm,
            format!("{} not found", executable.display()),
        ));
    }

    let major = detect_major(&executable, version_timeout).await?;
    let supported = server.supported_java();
    if !supported.is_empty() && !supported.contains(&major) {
        warn!(server = %server.name(), major = %major, supported = ?supported, "Unsupported JDK");
        return Err(CommandError::new(
            ErrorKind::WrongJavaVm,
            format!("Java {major} is not supported by {}, expected one of {supported:?}", server.name()),
        ));
    }

    debug!(home = %home.display(), major = %major, "Using JDK");
    Ok(JavaInstallation {
        home,
        executable,
        major,
    })
}

#[cfg(test)]
pub(crate) mod testing {
    //! Fake JDK homes made of shell scripts

    use std::path::{Path, PathBuf};

    /// Create `<root>/jdk/bin/java` running `body` for anything but `-version`
    #[cfg(unix)]
    pub fn fake_jdk(root: &Path, major: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let home = root.join("jdk");
        let bin = home.join("bin");
        std::fs::create_dir_all(&bin).unwrap();
        let script = format!(
            "#!/bin/sh\nif [ \"$1\" = \"-version\" ]; then\n  echo 'openjdk version \"{major}\" 2022-01-18' >&2\n  exit 0\nfi\n{body}\n"
        );
        let java = bin.join("java");
        std::fs::write(&java, script).unwrap();
        std::fs::set_permissions(&java, std::fs::Permissions::from_mode(0o755)).unwrap();
        home
    }
}
