// REST runner
//
// POST <scheme>://host:port/command/<command>. Parameters travel as a form
// body, or as multipart parts when the command uploads an artifact. JSON
// answers are decoded into an action report; plain-text answers are log
// chunks with an optional next-page URL.

use crate::exchange::{HttpExchange, HttpReply};
use crate::json_report::JsonReportDecoder;
use crate::query::encode_params;
use crate::upload::UploadArtifact;
use async_trait::async_trait;
use glassadmin_core::domain::command::DEFAULT_OPERAND_PARAM;
use glassadmin_core::domain::{Command, LogPayload, ResponseFormat, ResultValue};
use glassadmin_core::port::{
    CommandError, ErrorKind, ReportDecoder, Runner, RunnerStrategy, ServerEntity,
};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use std::sync::Arc;
use tracing::{debug, warn};

pub const COMMAND_PATH: &str = "command";

/// CSRF guard header required by the REST interface
pub const REQUESTED_BY_HEADER: &str = "X-Requested-By";
pub const REQUESTED_BY: &str = "glassadmin";

/// Next log page announced by plain-text responses
pub const NEXT_PAGE_HEADER: &str = "X-Text-Append-Next";

/// Multipart part carrying an uploaded artifact
pub const UPLOAD_PART: &str = "id";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

pub struct RestRunner {
    server: Arc<dyn ServerEntity>,
    command: Arc<Command>,
    exchange: HttpExchange,
    decoder: JsonReportDecoder,
}

impl RestRunner {
    pub fn new(server: Arc<dyn ServerEntity>, command: Arc<Command>, exchange: HttpExchange) -> Self {
        Self {
            server,
            command,
            exchange,
            decoder: JsonReportDecoder::new(),
        }
    }

    fn accept(&self) -> &'static str {
        match self.command.response_format() {
            ResponseFormat::Json => "application/json",
            ResponseFormat::PlainText => "text/plain",
        }
    }

    fn interpret(&self, reply: HttpReply) -> Result<Option<ResultValue>, CommandError> {
        if self.command.response_format() == ResponseFormat::PlainText {
            let text = String::from_utf8_lossy(&reply.body);
            return Ok(Some(ResultValue::Log(LogPayload {
                lines: text.lines().map(str::to_string).collect(),
                next_url: reply.header(NEXT_PAGE_HEADER).map(str::to_string),
            })));
        }

        let report = self.decoder.decode(&reply.body)?;
        if report.is_login_failure() {
            warn!(server = %self.server.name(), command = %self.command.name(), "Login rejected by server");
            return Err(CommandError::new(
                ErrorKind::Auth,
                report.message().unwrap_or_default(),
            ));
        }
        if !report.is_success(self.command.accepts_warning()) {
            return Err(CommandError::new(
                ErrorKind::CommandFailed,
                report.message().unwrap_or_default(),
            ));
        }
        Ok(report.flatten(self.command.value_kind()))
    }
}

#[async_trait]
impl Runner for RestRunner {
    fn strategy(&self) -> RunnerStrategy {
        RunnerStrategy::Rest
    }

    fn command(&self) -> &Arc<Command> {
        &self.command
    }

    fn server(&self) -> &Arc<dyn ServerEntity> {
        &self.server
    }

    async fn execute(&self) -> Result<Option<ResultValue>, CommandError> {
        let base = self.exchange.base_url(self.server.as_ref()).await?;
        let url = base
            .join(&format!("{COMMAND_PATH}/{}", self.command.name()))
            .map_err(|e| CommandError::new(ErrorKind::Protocol, e.to_string()))?;

        let artifact = match self.command.upload() {
            Some(path) => Some(UploadArtifact::load(path).await?),
            None => None,
        };
        let params = self.command.query_params();
        let form_body = encode_params(&params);
        debug!(url = %url, params = params.len(), "REST request");

        let reply = self
            .exchange
            .send(self.server.as_ref(), url, |client, url| {
                let request = client
                    .post(url)
                    .header(ACCEPT, self.accept())
                    .header(REQUESTED_BY_HEADER, REQUESTED_BY);
                match &artifact {
                    Some(artifact) => Ok(request.multipart(multipart(&params, artifact)?)),
                    None => Ok(request
                        .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
                        .body(form_body.clone())),
                }
            })
            .await?;

        self.interpret(reply)
    }
}

/// Named parameters as text parts, the artifact in place of the operand
fn multipart(params: &[(String, String)], artifact: &UploadArtifact) -> Result<Form, CommandError> {
    let file = Part::bytes(artifact.data.clone())
        .file_name(artifact.file_name.clone())
        .mime_str("application/octet-stream")
        .map_err(|e| CommandError::new(ErrorKind::Protocol, e.to_string()))?;
    let form = params
        .iter()
        .filter(|(k, _)| k != DEFAULT_OPERAND_PARAM)
        .fold(Form::new(), |form, (k, v)| form.text(k.clone(), v.clone()));
    Ok(form.part(UPLOAD_PART, file))
}
