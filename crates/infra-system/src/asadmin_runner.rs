// Local CLI runner
//
// Runs the server's bundled admin tool as a child process:
//   java -jar <server_home>/modules/admin-cli.jar --user <u> --passwordfile <f>
//        <command> --key=value ... <operand>
// The tool has no structured answer, so success is decided by the process-IO
// parser over its output.

use crate::config::LocalConfig;
use crate::jdk::{self, JavaInstallation};
use crate::password_file::{password_file_path, write_password_file, PasswordEntries};
use async_trait::async_trait;
use glassadmin_core::application::process_io::{drive, ProcessIoParser, ProcessIoResult};
use glassadmin_core::domain::{Command, ProcessIoContent, ResultValue};
use glassadmin_core::port::{CommandError, ErrorKind, Runner, RunnerStrategy, ServerEntity};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing::{info, warn};

/// Admin tool JAR relative to the server home
pub const ADMIN_CLI_JAR: &str = "modules/admin-cli.jar";

/// Parameter moved into the credential file instead of the argument line
pub const NEW_PASSWORD_PARAM: &str = "newpassword";

pub struct AsadminRunner {
    server: Arc<dyn ServerEntity>,
    command: Arc<Command>,
    config: LocalConfig,
}

impl AsadminRunner {
    pub fn new(server: Arc<dyn ServerEntity>, command: Arc<Command>, config: LocalConfig) -> Self {
        Self {
            server,
            command,
            config,
        }
    }

    /// # Errors
    /// `ErrorKind::Config` when the server home or the tool JAR is missing
    pub fn admin_jar(&self) -> Result<PathBuf, CommandError> {
        let home = self.server.server_home().ok_or_else(|| {
            CommandError::new(
                ErrorKind::Config,
                format!("server home of {} is not configured", self.server.name()),
            )
        })?;
        let jar = home.join(ADMIN_CLI_JAR);
        if !jar.is_file() {
            return Err(CommandError::new(
                ErrorKind::Config,
                format!("admin tool not found at {}", jar.display()),
            ));
        }
        Ok(jar)
    }

    /// Argument line after the java executable
    pub fn arguments(&self, jar: &Path, password_file: &Path) -> Vec<String> {
        let mut args: Vec<String> = self.command.jvm_options().to_vec();
        args.extend([
            "-jar".to_string(),
            jar.display().to_string(),
            "--user".to_string(),
            self.server.admin_user().to_string(),
            "--passwordfile".to_string(),
            password_file.display().to_string(),
            self.command.name().to_string(),
        ]);
        args.extend(
            self.command
                .named_params()
                .into_iter()
                .filter(|(k, _)| k != NEW_PASSWORD_PARAM)
                .map(|(k, v)| format!("--{k}={v}")),
        );
        if let Some(operand) = self.command.operand() {
            args.push(operand);
        }
        args
    }

    fn password_entries(&self) -> PasswordEntries {
        let entries = PasswordEntries::for_server(self.server.as_ref());
        match self
            .command
            .named_params()
            .into_iter()
            .find(|(k, _)| k == NEW_PASSWORD_PARAM)
        {
            Some((_, new_password)) => entries.with_new_password(new_password),
            None => entries,
        }
    }

    async fn run(&self, jdk: &JavaInstallation, args: &[String]) -> Result<String, CommandError> {
        let launch_err =
            |e: std::io::Error| CommandError::new(ErrorKind::ProcessLaunch, e.to_string());

        info!(
            server = %self.server.name(),
            command = %self.command.name(),
            java = %jdk.executable.display(),
            "Launching admin tool"
        );
        let mut child = tokio::process::Command::new(&jdk.executable)
            .args(args)
            .env("JAVA_HOME", &jdk.home)
            .env("AS_JAVA", &jdk.home)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(launch_err)?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| CommandError::new(ErrorKind::ProcessLaunch, "stdout not captured"))?;
        let stdin = child.stdin.take();
        let stderr_task = child.stderr.take().map(|mut stderr| {
            tokio::spawn(async move {
                let mut text = String::new();
                let _ = stderr.read_to_string(&mut text).await;
                text
            })
        });

        let content = self
            .command
            .process_io()
            .cloned()
            .unwrap_or_else(ProcessIoContent::command_executed);
        let mut parser = ProcessIoParser::new(&content);
        drive(&mut parser, stdout, stdin).await.map_err(launch_err)?;

        // Failures are reported on stderr, evaluate it after stdout
        if let Some(task) = stderr_task {
            if let Ok(text) = task.await {
                parser.feed(&text);
            }
        }
        parser.finish();
        let status = child.wait().await.map_err(launch_err)?;

        let output = parser.output_text();
        match parser.result() {
            ProcessIoResult::Success => Ok(output),
            ProcessIoResult::Error => Err(CommandError::new(ErrorKind::CommandFailed, output)),
            ProcessIoResult::Unknown => {
                warn!(
                    command = %self.command.name(),
                    exit = ?status.code(),
                    "Admin tool output matched no expected token"
                );
                Err(CommandError::new(
                    ErrorKind::CommandFailed,
                    format!("no result recognized (exit {:?}): {output}", status.code()),
                ))
            }
        }
    }
}

#[async_trait]
impl Runner for AsadminRunner {
    fn strategy(&self) -> RunnerStrategy {
        RunnerStrategy::Asadmin
    }

    fn command(&self) -> &Arc<Command> {
        &self.command
    }

    fn server(&self) -> &Arc<dyn ServerEntity> {
        &self.server
    }

    async fn execute(&self) -> Result<Option<ResultValue>, CommandError> {
        let jdk = jdk::verify(&self.command, self.server.as_ref(), self.config.version_timeout).await?;
        let jar = self.admin_jar()?;

        let password_file =
            password_file_path(self.config.password_file_dir.as_deref(), self.server.as_ref());
        write_password_file(&password_file, &self.password_entries()).await?;

        let args = self.arguments(&jar, &password_file);
        let output = self.run(&jdk, &args).await?;
        Ok(Some(ResultValue::Text(output)))
    }
}
