// Local JVM bootstrap runner
//
// Starts the server itself with a plain java command line. Completion means
// the process is up; its merged output is handed over with the process.

use crate::config::{LocalConfig, OUTPUT_CHANNEL_CAPACITY};
use crate::jdk::{self, JavaInstallation};
use async_trait::async_trait;
use glassadmin_core::domain::{Command, LaunchedProcess, ResultValue};
use glassadmin_core::port::{CommandError, ErrorKind, Runner, RunnerStrategy, ServerEntity};
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};

/// Bootstrap JAR relative to the server home, used without an explicit classpath
pub const BOOTSTRAP_JAR: &str = "modules/glassfish.jar";

pub const MAIN_CLASS: &str = "com.sun.enterprise.glassfish.bootstrap.ASMain";

pub struct LocalJvmRunner {
    server: Arc<dyn ServerEntity>,
    command: Arc<Command>,
    config: LocalConfig,
}

impl LocalJvmRunner {
    pub fn new(server: Arc<dyn ServerEntity>, command: Arc<Command>, config: LocalConfig) -> Self {
        Self {
            server,
            command,
            config,
        }
    }

    /// Explicit classpath, else the bootstrap JAR under the server home
    ///
    /// # Errors
    /// `ErrorKind::Config` when neither is available
    pub fn class_path(&self) -> Result<String, CommandError> {
        if let Some(cp) = self.command.class_path() {
            return Ok(cp.to_string());
        }
        let home = self.server.server_home().ok_or_else(|| {
            CommandError::new(
                ErrorKind::Config,
                format!("server home of {} is not configured", self.server.name()),
            )
        })?;
        let jar = home.join(BOOTSTRAP_JAR);
        if !jar.is_file() {
            return Err(CommandError::new(
                ErrorKind::Config,
                format!("bootstrap JAR not found at {}", jar.display()),
            ));
        }
        Ok(jar.display().to_string())
    }

    /// JVM options, classpath, main class, then boot arguments
    pub fn arguments(&self, class_path: &str) -> Vec<String> {
        let mut args: Vec<String> = self.command.jvm_options().to_vec();
        args.extend(["-cp".to_string(), class_path.to_string(), MAIN_CLASS.to_string()]);

        if let Some(domain_dir) = self.server.domain_dir() {
            if let Some(name) = domain_dir.file_name() {
                args.push("-domainname".to_string());
                args.push(name.to_string_lossy().into_owned());
            }
            args.push("-domaindir".to_string());
            args.push(domain_dir.display().to_string());
        }
        for (key, value) in self.command.named_params() {
            args.push(format!("-{key}"));
            args.push(value);
        }
        args
    }

    fn launch(&self, jdk: &JavaInstallation, args: &[String]) -> Result<LaunchedProcess, CommandError> {
        let mut child = tokio::process::Command::new(&jdk.executable)
            .args(args)
            .env("JAVA_HOME", &jdk.home)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| CommandError::new(ErrorKind::ProcessLaunch, e.to_string()))?;

        let (tx, rx) = mpsc::channel(OUTPUT_CHANNEL_CAPACITY);
        if let Some(stdout) = child.stdout.take() {
            forward_lines(stdout, tx.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            forward_lines(stderr, tx);
        }

        let pid = child.id();
        info!(server = %self.server.name(), pid = ?pid, "Server process launched");
        Ok(LaunchedProcess {
            pid,
            child,
            output: rx,
        })
    }
}

/// Forward lines of one stream into the shared channel until EOF
///
/// The pipe is always drained so the server never blocks on a full pipe:
/// lines that find the channel full or closed are dropped and counted.
fn forward_lines<R>(stream: R, tx: mpsc::Sender<String>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(stream).lines();
        let mut dropped = 0u64;
        while let Ok(Some(line)) = lines.next_line().await {
            match tx.try_send(line) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) | Err(TrySendError::Closed(_)) => dropped += 1,
            }
        }
        if dropped > 0 {
            warn!(dropped, "Server output lines dropped, receiver did not keep up");
        } else {
            debug!("Server output stream closed");
        }
    });
}

#[async_trait]
impl Runner for LocalJvmRunner {
    fn strategy(&self) -> RunnerStrategy {
        RunnerStrategy::LocalJvm
    }

    fn command(&self) -> &Arc<Command> {
        &self.command
    }

    fn server(&self) -> &Arc<dyn ServerEntity> {
        &self.server
    }

    async fn execute(&self) -> Result<Option<ResultValue>, CommandError> {
        let jdk = jdk::verify(&self.command, self.server.as_ref(), self.config.version_timeout).await?;
        let class_path = self.class_path()?;
        let args = self.arguments(&class_path);
        let process = self.launch(&jdk, &args)?;
        Ok(Some(ResultValue::Process(process)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glassadmin_core::domain::{CommandScope, ServerDescriptor};
    use std::path::{Path, PathBuf};

    fn server(home: &Path) -> ServerDescriptor {
        let mut server = ServerDescriptor::new("payara", "localhost", 4848);
        server.server_home = Some(home.to_path_buf());
        server.domains_folder = Some(home.join("domains"));
        server.domain_name = Some("domain1".into());
        server
    }

    #[test]
    fn test_boot_arguments() {
        let command = Command::new("start-domain")
            .with_scope(CommandScope::JavaClassPath {
                java_home: None,
                class_path: Some("/opt/cp/glassfish.jar".into()),
            })
            .with_jvm_option("-Xmx512m")
            .with_param("debug", "true");
        let runner = LocalJvmRunner::new(
            Arc::new(server(Path::new("/opt/payara"))),
            Arc::new(command),
            LocalConfig::default(),
        );

        let cp = runner.class_path().unwrap();
        assert_eq!(
            runner.arguments(&cp),
            vec![
                "-Xmx512m",
                "-cp",
                "/opt/cp/glassfish.jar",
                MAIN_CLASS,
                "-domainname",
                "domain1",
                "-domaindir",
                "/opt/payara/domains/domain1",
                "-debug",
                "true",
            ]
        );
    }

    #[test]
    fn test_missing_bootstrap_jar_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let runner = LocalJvmRunner::new(
            Arc::new(server(dir.path())),
            Arc::new(Command::new("start-domain")),
            LocalConfig::default(),
        );
        assert_eq!(runner.class_path().unwrap_err().kind, ErrorKind::Config);
    }

    #[tokio::test]
    async fn test_no_jvm_fails_before_launch() {
        let dir = tempfile::tempdir().unwrap();
        let mut server = server(dir.path());
        server.java_home = Some(PathBuf::from("/nonexistent/jdk"));
        let runner = LocalJvmRunner::new(
            Arc::new(server),
            Arc::new(Command::new("start-domain")),
            LocalConfig::default(),
        );
        assert_eq!(runner.execute().await.unwrap_err().kind, ErrorKind::NoJavaVm);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unread_output_does_not_stall_server() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("modules")).unwrap();
        std::fs::write(dir.path().join(BOOTSTRAP_JAR), b"").unwrap();
        let mut server = server(dir.path());
        server.java_home = Some(crate::jdk::testing::fake_jdk(
            dir.path(),
            "11.0.20",
            "i=0\nwhile [ $i -lt 50000 ]; do echo \"log line $i padded to fill the pipe quickly\"; i=$((i+1)); done",
        ));
        let runner = LocalJvmRunner::new(
            Arc::new(server),
            Arc::new(Command::new("start-domain")),
            LocalConfig::default(),
        );

        let value = runner.execute().await.unwrap().unwrap();
        let mut process = value.into_process().unwrap();

        let status = tokio::time::timeout(std::time::Duration::from_secs(30), process.child.wait())
            .await
            .expect("server stalled on undrained output")
            .unwrap();
        assert!(status.success());

        let mut received = 0usize;
        while process.output.try_recv().is_ok() {
            received += 1;
        }
        assert!(received <= OUTPUT_CHANNEL_CAPACITY);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_launch_merges_output() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("modules")).unwrap();
        std::fs::write(dir.path().join(BOOTSTRAP_JAR), b"").unwrap();
        let mut server = server(dir.path());
        server.java_home = Some(crate::jdk::testing::fake_jdk(
            dir.path(),
            "11.0.20",
            "echo \"boot $*\"\necho \"warming up\" >&2",
        ));
        let runner = LocalJvmRunner::new(
            Arc::new(server),
            Arc::new(Command::new("start-domain")),
            LocalConfig::default(),
        );

        let value = runner.execute().await.unwrap().unwrap();
        let mut process = value.into_process().unwrap();
        assert!(process.pid.is_some());

        let mut lines = Vec::new();
        while let Some(line) = process.output.recv().await {
            lines.push(line);
        }
        process.child.wait().await.unwrap();

        assert!(lines.iter().any(|l| l.starts_with("boot ") && l.contains(MAIN_CLASS)));
        assert!(lines.iter().any(|l| l == "warming up"));
    }
}
