// Generic action report produced by response decoders

use crate::domain::command::ValueKind;
use crate::domain::result::{LogPayload, ResultValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Message marker of a server-side login failure, on either admin interface
pub const LOGIN_EXCEPTION: &str = "javax.security.auth.login.LoginException";

/// Exit code reported by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitCode {
    Success,
    Warning,
    Failure,
}

impl ExitCode {
    /// Parse a wire value, unknown codes count as failure
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "SUCCESS" => ExitCode::Success,
            "WARNING" => ExitCode::Warning,
            _ => ExitCode::Failure,
        }
    }
}

/// Node of the message tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePart {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    #[serde(default)]
    pub children: Vec<MessagePart>,
}

/// Decoded response of one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionReport {
    pub exit_code: ExitCode,
    pub top: MessagePart,
    /// Next poll URL for paged log responses
    pub next_url: Option<String>,
}

impl ActionReport {
    pub fn new(exit_code: ExitCode, top: MessagePart) -> Self {
        Self {
            exit_code,
            top,
            next_url: None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        self.top.message.as_deref()
    }

    /// Server rejected the credentials inside an otherwise valid answer
    pub fn is_login_failure(&self) -> bool {
        self.message().is_some_and(|m| m.contains(LOGIN_EXCEPTION))
    }

    /// Success decision, optionally promoting WARNING to success
    pub fn is_success(&self, accept_warning: bool) -> bool {
        match self.exit_code {
            ExitCode::Success => true,
            ExitCode::Warning => accept_warning,
            ExitCode::Failure => false,
        }
    }

    /// Flatten the message tree into the typed value a command expects
    pub fn flatten(&self, kind: ValueKind) -> Option<ResultValue> {
        match kind {
            ValueKind::Text => Some(ResultValue::Text(
                self.top.message.clone().unwrap_or_default(),
            )),
            ValueKind::List => Some(ResultValue::List(
                self.top
                    .children
                    .iter()
                    .filter_map(|c| c.message.clone())
                    .filter(|m| !m.is_empty())
                    .collect(),
            )),
            ValueKind::Map => {
                let mut map = self.top.properties.clone();
                for child in &self.top.children {
                    if let Some((k, v)) = child.message.as_deref().and_then(|m| m.split_once('=')) {
                        map.insert(k.trim().to_string(), v.trim().to_string());
                    }
                }
                Some(ResultValue::Map(map))
            }
            ValueKind::Log => Some(ResultValue::Log(LogPayload {
                lines: self
                    .top
                    .message
                    .as_deref()
                    .map(|m| m.lines().map(str::to_string).collect())
                    .unwrap_or_default(),
                next_url: self.next_url.clone(),
            })),
            ValueKind::Process => None,
        }
    }
}
