// Command Domain Model
//
// A Command is a pure data carrier describing one administrative operation.
// Scoping (target, name, java environment) is composed, not inherited.

use crate::domain::process_io::ProcessIoContent;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

/// Query parameter carrying the primary operand
pub const DEFAULT_OPERAND_PARAM: &str = "DEFAULT";

/// Query parameter carrying encoded properties
pub const PROPERTY_PARAM: &str = "property";

/// Query parameter carrying the target of target-scoped commands
pub const TARGET_PARAM: &str = "target";

/// Transport a command prefers, declared statically by the command author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Transport {
    /// Whatever administration interface the server exposes (HTTP or REST)
    Remote,
    /// The server's bundled command-line tool as a child process
    LocalCli,
    /// Direct JVM bootstrap of the server itself
    LocalJvm,
}

/// Shape of the value a successful command produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValueKind {
    Text,
    List,
    Map,
    Log,
    Process,
}

/// Response representation requested from the REST interface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseFormat {
    Json,
    PlainText,
}

/// Scoping a command adds on top of its verb
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CommandScope {
    #[default]
    Plain,
    Target {
        target: Option<String>,
    },
    TargetName {
        target: Option<String>,
        name: String,
    },
    Java {
        java_home: Option<PathBuf>,
    },
    JavaClassPath {
        java_home: Option<PathBuf>,
        class_path: Option<String>,
    },
}

/// One administrative operation
#[derive(Debug)]
pub struct Command {
    name: String,
    scope: CommandScope,
    transport: Transport,
    value_kind: ValueKind,
    response_format: ResponseFormat,
    operand: Option<String>,
    params: Vec<(String, String)>,
    properties: BTreeMap<String, String>,
    upload: Option<PathBuf>,
    jvm_options: Vec<String>,
    accept_warning: bool,
    process_io: Option<ProcessIoContent>,
    retry: AtomicBool,
}

impl Command {
    /// Create a plain remote command producing a text value
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scope: CommandScope::Plain,
            transport: Transport::Remote,
            value_kind: ValueKind::Text,
            response_format: ResponseFormat::Json,
            operand: None,
            params: Vec::new(),
            properties: BTreeMap::new(),
            upload: None,
            jvm_options: Vec::new(),
            accept_warning: false,
            process_io: None,
            retry: AtomicBool::new(false),
        }
    }

    pub fn with_scope(mut self, scope: CommandScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_transport(mut self, transport: Transport) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_value_kind(mut self, kind: ValueKind) -> Self {
        self.value_kind = kind;
        self
    }

    pub fn with_response_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = format;
        self
    }

    pub fn with_operand(mut self, operand: impl Into<String>) -> Self {
        self.operand = Some(operand.into());
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Attach a local artifact to be uploaded (deploy-type commands)
    pub fn with_upload(mut self, path: impl Into<PathBuf>) -> Self {
        self.upload = Some(path.into());
        self
    }

    pub fn with_jvm_option(mut self, option: impl Into<String>) -> Self {
        self.jvm_options.push(option.into());
        self
    }

    /// Treat a WARNING exit code as success
    pub fn accepting_warning(mut self) -> Self {
        self.accept_warning = true;
        self
    }

    pub fn with_process_io(mut self, content: ProcessIoContent) -> Self {
        self.process_io = Some(content);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scope(&self) -> &CommandScope {
        &self.scope
    }

    pub fn transport(&self) -> Transport {
        self.transport
    }

    pub fn value_kind(&self) -> ValueKind {
        self.value_kind
    }

    pub fn response_format(&self) -> ResponseFormat {
        self.response_format
    }

    pub fn upload(&self) -> Option<&Path> {
        self.upload.as_deref()
    }

    pub fn jvm_options(&self) -> &[String] {
        &self.jvm_options
    }

    pub fn accepts_warning(&self) -> bool {
        self.accept_warning
    }

    pub fn process_io(&self) -> Option<&ProcessIoContent> {
        self.process_io.as_ref()
    }

    /// Java home requested by java-scoped commands
    pub fn java_home(&self) -> Option<&Path> {
        match &self.scope {
            CommandScope::Java { java_home } | CommandScope::JavaClassPath { java_home, .. } => {
                java_home.as_deref()
            }
            _ => None,
        }
    }

    pub fn class_path(&self) -> Option<&str> {
        match &self.scope {
            CommandScope::JavaClassPath { class_path, .. } => class_path.as_deref(),
            _ => None,
        }
    }

    pub fn target(&self) -> Option<&str> {
        match &self.scope {
            CommandScope::Target { target } | CommandScope::TargetName { target, .. } => {
                target.as_deref()
            }
            _ => None,
        }
    }

    /// Primary operand: explicit operand, else the scoped name, else the
    /// upload's file name
    pub fn operand(&self) -> Option<String> {
        if let Some(operand) = &self.operand {
            return Some(operand.clone());
        }
        if let CommandScope::TargetName { name, .. } = &self.scope {
            return Some(name.clone());
        }
        self.upload
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
    }

    /// Named parameters in wire order, without the primary operand
    pub fn named_params(&self) -> Vec<(String, String)> {
        let mut out = self.params.clone();
        if let Some(target) = self.target() {
            out.push((TARGET_PARAM.to_string(), target.to_string()));
        }
        if !self.properties.is_empty() {
            out.push((PROPERTY_PARAM.to_string(), encode_properties(&self.properties)));
        }
        out
    }

    /// Full parameter list for HTTP and REST: named params then `DEFAULT`
    pub fn query_params(&self) -> Vec<(String, String)> {
        let mut out = self.named_params();
        if let Some(operand) = self.operand() {
            out.push((DEFAULT_OPERAND_PARAM.to_string(), operand));
        }
        out
    }

    /// Mark the command for resubmission by the caller
    pub fn request_retry(&self) {
        self.retry.store(true, Ordering::SeqCst);
    }

    /// Whether the server asked to try again later
    pub fn is_retry(&self) -> bool {
        self.retry.load(Ordering::SeqCst)
    }
}

/// Encode a property map as `k1=v1:k2=v2`, escaping `:` in keys and values
pub fn encode_properties(properties: &BTreeMap<String, String>) -> String {
    properties
        .iter()
        .map(|(k, v)| format!("{}={}", k.replace(':', "\\:"), v.replace(':', "\\:")))
        .collect::<Vec<_>>()
        .join(":")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_params_order() {
        let cmd = Command::new("create-jdbc-resource")
            .with_scope(CommandScope::Target {
                target: Some("server".to_string()),
            })
            .with_param("connectionpoolid", "DerbyPool")
            .with_property("url", "jdbc:derby://localhost:1527/db")
            .with_operand("jdbc/app");

        let params = cmd.query_params();
        assert_eq!(params[0], ("connectionpoolid".into(), "DerbyPool".into()));
        assert_eq!(params[1], ("target".into(), "server".into()));
        assert_eq!(
            params[2],
            (
                "property".into(),
                "url=jdbc\\:derby\\://localhost\\:1527/db".into()
            )
        );
        assert_eq!(params[3], ("DEFAULT".into(), "jdbc/app".into()));
    }

    #[test]
    fn test_operand_falls_back_to_name_then_upload() {
        let named = Command::new("undeploy").with_scope(CommandScope::TargetName {
            target: None,
            name: "hello".to_string(),
        });
        assert_eq!(named.operand().as_deref(), Some("hello"));

        let upload = Command::new("deploy").with_upload("/tmp/app/hello.war");
        assert_eq!(upload.operand().as_deref(), Some("hello.war"));

        assert_eq!(Command::new("version").operand(), None);
    }

    #[test]
    fn test_retry_flag() {
        let cmd = Command::new("deploy");
        assert!(!cmd.is_retry());
        cmd.request_retry();
        assert!(cmd.is_retry());
    }

    #[test]
    fn test_java_scope_accessors() {
        let cmd = Command::new("start-domain")
            .with_transport(Transport::LocalJvm)
            .with_scope(CommandScope::JavaClassPath {
                java_home: Some(PathBuf::from("/opt/jdk")),
                class_path: Some("/opt/gf/modules/glassfish.jar".into()),
            });
        assert_eq!(cmd.java_home(), Some(Path::new("/opt/jdk")));
        assert_eq!(cmd.class_path(), Some("/opt/gf/modules/glassfish.jar"));
        assert_eq!(cmd.target(), None);
    }
}
