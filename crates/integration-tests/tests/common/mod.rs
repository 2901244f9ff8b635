//! Shared fixtures: a canned admin endpoint and fake server installs

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use glassadmin_core::domain::{Scheme, ServerDescriptor};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// One request as the endpoint received it
#[derive(Debug, Clone)]
pub struct Seen {
    pub head: String,
    pub body: Vec<u8>,
}

impl Seen {
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

/// Canned endpoint answering one response per connection, in order
pub struct Endpoint {
    pub port: u16,
    pub seen: Arc<Mutex<Vec<Seen>>>,
    pub accepted: Arc<AtomicUsize>,
}

impl Endpoint {
    pub async fn start(responses: Vec<String>) -> Self {
        Self::start_with_delay(responses, Duration::ZERO).await
    }

    /// Like `start`, but hold every answer back for `delay`
    pub async fn start_with_delay(responses: Vec<String>, delay: Duration) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let accepted = Arc::new(AtomicUsize::new(0));

        let sink = Arc::clone(&seen);
        let counter = Arc::clone(&accepted);
        tokio::spawn(async move {
            for response in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                counter.fetch_add(1, Ordering::SeqCst);
                let request = read_request(&mut socket).await;
                sink.lock().unwrap().push(request);
                tokio::time::sleep(delay).await;
                socket.write_all(response.as_bytes()).await.unwrap();
                let _ = socket.shutdown().await;
            }
        });

        Self {
            port,
            seen,
            accepted,
        }
    }

    pub fn requests(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }

    pub fn connections(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    /// Descriptor for a server behind this endpoint, plain http
    pub fn server(&self, name: &str) -> ServerDescriptor {
        let mut server = ServerDescriptor::new(name, "127.0.0.1", self.port);
        server.admin_scheme = Some(Scheme::Http);
        server.admin_password = Some("adminadmin".into());
        server
    }
}

async fn read_request(socket: &mut TcpStream) -> Seen {
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
            l.to_ascii_lowercase()
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
    Seen { head, body }
}

pub fn response(status: &str, content_type: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )
}

pub fn json(body: &str) -> String {
    response("200 OK", "application/json", body)
}

/// Legacy manifest answer
pub fn manifest(exit_code: &str, message: &str) -> String {
    response(
        "200 OK",
        "text/plain",
        &format!("Manifest-Version: 1.0\r\nexit-code: {exit_code}\r\nmessage: {message}\r\n\r\n"),
    )
}

/// Server install under `root` with an admin tool JAR and a JDK whose
/// `java` runs `body` for anything but `-version`
#[cfg(unix)]
pub fn fake_install(root: &Path, body: &str) -> ServerDescriptor {
    use std::os::unix::fs::PermissionsExt;

    let modules = root.join("glassfish").join("modules");
    std::fs::create_dir_all(&modules).unwrap();
    std::fs::write(modules.join("admin-cli.jar"), b"").unwrap();
    std::fs::write(modules.join("glassfish.jar"), b"").unwrap();

    let jdk: PathBuf = root.join("jdk");
    std::fs::create_dir_all(jdk.join("bin")).unwrap();
    let script = format!(
        "#!/bin/sh\nif [ \"$1\" = \"-version\" ]; then\n  echo 'openjdk version \"17.0.2\" 2022-01-18' >&2\n  exit 0\nfi\n{body}\n"
    );
    let java = jdk.join("bin").join("java");
    std::fs::write(&java, script).unwrap();
    std::fs::set_permissions(&java, std::fs::Permissions::from_mode(0o755)).unwrap();

    let mut server = ServerDescriptor::new("local", "localhost", 4848);
    server.server_home = Some(root.join("glassfish"));
    server.domains_folder = Some(root.join("glassfish").join("domains"));
    server.domain_name = Some("domain1".into());
    server.java_home = Some(jdk);
    server.admin_password = Some("adminadmin".into());
    server
}
