// Shared HTTP exchange for both admin transports
//
// Redirects are followed by hand so every hop carries the credentials and a
// repeated URL can be detected. Redirect hops and authenticator resends do not
// consume the retry budget; only transport failures do.

use crate::config::HttpConfig;
use crate::scheme::resolve_scheme;
use glassadmin_core::application::RetryDecision;
use glassadmin_core::port::{Authenticator, CommandError, Credentials, ErrorKind, ServerEntity};
use reqwest::header::{HeaderMap, LOCATION};
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Fully read response
#[derive(Debug)]
pub struct HttpReply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl HttpReply {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header(reqwest::header::CONTENT_TYPE.as_str())
    }
}

pub struct HttpExchange {
    client: Client,
    config: HttpConfig,
    authenticator: Option<Arc<dyn Authenticator>>,
}

impl HttpExchange {
    /// # Errors
    /// `ErrorKind::Config` when the HTTP client cannot be built
    pub fn new(
        config: HttpConfig,
        authenticator: Option<Arc<dyn Authenticator>>,
    ) -> Result<Self, CommandError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.read_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .danger_accept_invalid_certs(config.trust_all_certs)
            .build()
            .map_err(|e| CommandError::new(ErrorKind::Config, format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            config,
            authenticator,
        })
    }

    /// Same client and settings, bound to a per-runner authenticator
    pub fn with_authenticator(&self, authenticator: Option<Arc<dyn Authenticator>>) -> Self {
        Self {
            client: self.client.clone(),
            config: self.config.clone(),
            authenticator,
        }
    }

    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    /// `scheme://host:port` of the server's admin listener
    ///
    /// # Errors
    /// `ErrorKind::Protocol` when host and port do not form a valid URL
    pub async fn base_url(&self, server: &dyn ServerEntity) -> Result<Url, CommandError> {
        let scheme = resolve_scheme(server, self.config.detect_timeout).await;
        let host = server.host();
        let authority = if host.contains(':') && !host.starts_with('[') {
            format!("[{host}]")
        } else {
            host.to_string()
        };
        let raw = format!("{}://{}:{}/", scheme.as_str(), authority, server.admin_port());
        Url::parse(&raw)
            .map_err(|e| CommandError::new(ErrorKind::Protocol, format!("invalid URL {raw}: {e}")))
    }

    /// Send a request built by `build` until it yields a final response
    ///
    /// `build` is called once per attempt and per redirect hop, so request
    /// bodies are rebuilt rather than replayed.
    ///
    /// # Errors
    /// * `ErrorKind::Protocol` - request construction failure or redirect loop
    /// * `ErrorKind::AuthHttp` - 401/403
    /// * `ErrorKind::BadGateway` - 502
    /// * `ErrorKind::CommandFailed` - any other non-success status
    /// * `ErrorKind::Transport` - connection or read failure after retries
    pub async fn send<F>(
        &self,
        server: &dyn ServerEntity,
        url: Url,
        build: F,
    ) -> Result<HttpReply, CommandError>
    where
        F: Fn(&Client, Url) -> Result<RequestBuilder, CommandError>,
    {
        let mut url = url;
        let mut visited = HashSet::from([url.to_string()]);
        let mut credentials = configured_credentials(server);
        let mut asked_authenticator = false;
        let mut failures = 0u32;

        loop {
            let mut request = build(&self.client, url.clone())?;
            if let Some(c) = &credentials {
                request = request.basic_auth(&c.user, Some(&c.password));
            }

            let reply = match read_reply(request).await {
                Ok(reply) => reply,
                Err(err) => {
                    failures += 1;
                    match self.config.retry.should_retry(failures, &err) {
                        RetryDecision::Retry(delay) => {
                            tokio::time::sleep(delay).await;
                            continue;
                        }
                        RetryDecision::Failed => return Err(err),
                    }
                }
            };

            let status = reply.status;
            if status.is_redirection() {
                let next = redirect_target(&url, &reply)?;
                if !visited.insert(next.to_string()) {
                    return Err(CommandError::new(
                        ErrorKind::Protocol,
                        format!("redirect loop at {next}"),
                    ));
                }
                debug!(from = %url, to = %next, "Following redirect");
                url = next;
                continue;
            }

            if status == StatusCode::UNAUTHORIZED && credentials.is_none() && !asked_authenticator {
                asked_authenticator = true;
                if let Some(c) = self.authenticator.as_ref().and_then(|a| a.credentials(server)) {
                    debug!(server = %server.name(), user = %c.user, "Resending with authenticator credentials");
                    credentials = Some(c);
                    continue;
                }
            }

            return check_status(server, reply);
        }
    }
}

/// Basic credentials from the server entity, only with a non-empty password
fn configured_credentials(server: &dyn ServerEntity) -> Option<Credentials> {
    server
        .admin_password()
        .filter(|p| !p.is_empty())
        .map(|password| Credentials {
            user: server.admin_user().to_string(),
            password: password.to_string(),
        })
}

async fn read_reply(request: RequestBuilder) -> Result<HttpReply, CommandError> {
    let response = request.send().await.map_err(|e| {
        if e.is_builder() {
            CommandError::new(ErrorKind::Protocol, e.to_string())
        } else {
            CommandError::new(ErrorKind::Transport, e.to_string())
        }
    })?;
    let status = response.status();
    let headers = response.headers().clone();
    let body = response
        .bytes()
        .await
        .map_err(|e| CommandError::new(ErrorKind::Transport, format!("reading response: {e}")))?;
    Ok(HttpReply {
        status,
        headers,
        body: body.to_vec(),
    })
}

fn redirect_target(current: &Url, reply: &HttpReply) -> Result<Url, CommandError> {
    let location = reply.header(LOCATION.as_str()).ok_or_else(|| {
        CommandError::new(
            ErrorKind::Protocol,
            format!("HTTP {} without Location header", reply.status.as_u16()),
        )
    })?;
    current.join(location).map_err(|e| {
        CommandError::new(ErrorKind::Protocol, format!("invalid redirect {location}: {e}"))
    })
}

fn check_status(server: &dyn ServerEntity, reply: HttpReply) -> Result<HttpReply, CommandError> {
    let status = reply.status;
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            warn!(server = %server.name(), status = %status.as_u16(), "Admin authentication rejected");
            Err(CommandError::new(
                ErrorKind::AuthHttp,
                format!("HTTP {}", status.as_u16()),
            ))
        }
        StatusCode::BAD_GATEWAY => Err(CommandError::new(
            ErrorKind::BadGateway,
            format!("HTTP 502 from {}:{}", server.host(), server.admin_port()),
        )),
        s if !s.is_success() => Err(CommandError::new(
            ErrorKind::CommandFailed,
            format!("HTTP status {}", s.as_u16()),
        )),
        _ => Ok(reply),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Minimal canned HTTP/1.1 server for transport tests

    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Request line, headers and body as seen by the server
    #[derive(Debug, Clone)]
    pub struct Captured {
        pub head: String,
        pub body: Vec<u8>,
    }

    impl Captured {
        pub fn request_line(&self) -> &str {
            self.head.lines().next().unwrap_or_default()
        }

        pub fn header(&self, name: &str) -> Option<String> {
            let prefix = format!("{}:", name.to_ascii_lowercase());
            self.head
                .lines()
                .find(|l| l.to_ascii_lowercase().starts_with(&prefix))
                .map(|l| l[prefix.len()..].trim().to_string())
        }
    }

    /// Serve `responses` in order, one connection each; returns the port and
    /// the captured requests
    pub async fn serve(responses: Vec<String>) -> (u16, Arc<Mutex<Vec<Captured>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let captured = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&captured);
        tokio::spawn(async move {
            for response in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                let request = read_request(&mut socket).await;
                sink.lock().unwrap().push(request);
                socket.write_all(response.as_bytes()).await.unwrap();
                let _ = socket.shutdown().await;
            }
        });
        (port, captured)
    }

    async fn read_request(socket: &mut tokio::net::TcpStream) -> Captured {
        let mut data = Vec::new();
        let mut buf = [0u8; 4096];
        let head_end = loop {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break data.len();
            }
            data.extend_from_slice(&buf[..n]);
            if let Some(pos) = data.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };
        let head = String::from_utf8_lossy(&data[..head_end]).into_owned();
        let length = head
            .lines()
            .find_map(|l| {
                let lower = l.to_ascii_lowercase();
                lower
                    .strip_prefix("content-length:")
                    .and_then(|v| v.trim().parse::<usize>().ok())
            })
            .unwrap_or(0);
        let mut body = data[head_end.min(data.len())..].to_vec();
        while body.len() < length {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            body.extend_from_slice(&buf[..n]);
        }
        Captured { head, body }
    }

    pub fn response(status: &str, headers: &[(&str, &str)], body: &str) -> String {
        let mut out = format!("HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n", body.len());
        for (k, v) in headers {
            out.push_str(&format!("{k}: {v}\r\n"));
        }
        out.push_str("\r\n");
        out.push_str(body);
        out
    }
}
