// Legacy query-string HTTP runner
//
// GET <scheme>://host:port/__asadmin/<command>?<query>, switched to POST with
// a ZIP body when the command uploads an artifact. The answer is a manifest.

use crate::exchange::HttpExchange;
use crate::manifest::ManifestDecoder;
use crate::query::encode_params;
use crate::upload::{UploadArtifact, ZIP_CONTENT_TYPE};
use async_trait::async_trait;
use glassadmin_core::domain::{ActionReport, Command, ExitCode, ResultValue};
use glassadmin_core::port::{
    CommandError, ErrorKind, ReportDecoder, Runner, RunnerStrategy, ServerEntity,
};
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use std::sync::Arc;
use tracing::{info, warn};

/// Path prefix of the legacy admin listener
pub const ADMIN_PATH: &str = "__asadmin";

/// User agent the legacy listener expects from admin clients
pub const LEGACY_USER_AGENT: &str = "hk2-agent";

/// Message marker of a server asking the client to come back later
pub const PLEASE_WAIT: &str = "please wait";

pub struct HttpRunner {
    server: Arc<dyn ServerEntity>,
    command: Arc<Command>,
    exchange: HttpExchange,
    decoder: ManifestDecoder,
}

impl HttpRunner {
    pub fn new(server: Arc<dyn ServerEntity>, command: Arc<Command>, exchange: HttpExchange) -> Self {
        Self {
            server,
            command,
            exchange,
            decoder: ManifestDecoder::new(),
        }
    }

    /// Interpret a decoded manifest for this command
    fn interpret(&self, report: ActionReport) -> Result<Option<ResultValue>, CommandError> {
        let message = report.message().unwrap_or_default();

        if report.is_login_failure() {
            warn!(server = %self.server.name(), command = %self.command.name(), "Login rejected by server");
            return Err(CommandError::new(ErrorKind::Auth, message));
        }
        if message.to_lowercase().contains(PLEASE_WAIT) {
            info!(server = %self.server.name(), command = %self.command.name(), "Server asked to retry later");
            self.command.request_retry();
        }
        if report.exit_code == ExitCode::Failure {
            return Err(CommandError::new(ErrorKind::CommandFailed, message));
        }
        Ok(report.flatten(self.command.value_kind()))
    }
}

#[async_trait]
impl Runner for HttpRunner {
    fn strategy(&self) -> RunnerStrategy {
        RunnerStrategy::Http
    }

    fn command(&self) -> &Arc<Command> {
        &self.command
    }

    fn server(&self) -> &Arc<dyn ServerEntity> {
        &self.server
    }

    async fn execute(&self) -> Result<Option<ResultValue>, CommandError> {
        let base = self.exchange.base_url(self.server.as_ref()).await?;
        let mut url = base
            .join(&format!("{ADMIN_PATH}/{}", self.command.name()))
            .map_err(|e| CommandError::new(ErrorKind::Protocol, e.to_string()))?;
        let query = encode_params(&self.command.query_params());
        if !query.is_empty() {
            url.set_query(Some(&query));
        }

        let body = match self.command.upload() {
            Some(path) => Some(UploadArtifact::load(path).await?.to_zip()?),
            None => None,
        };

        let reply = self
            .exchange
            .send(self.server.as_ref(), url, |client, url| {
                let request = match &body {
                    Some(zip) => client
                        .post(url)
                        .header(CONTENT_TYPE, ZIP_CONTENT_TYPE)
                        .body(zip.clone()),
                    None => client.get(url),
                };
                Ok(request.header(USER_AGENT, LEGACY_USER_AGENT))
            })
            .await?;

        let report = self.decoder.decode(&reply.body)?;
        self.interpret(report)
    }
}
