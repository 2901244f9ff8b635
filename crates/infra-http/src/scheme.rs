// Secure-scheme detection
//
// Sends a plain HTTP request and looks at the first bytes of the answer:
// an HTTP status line means plain HTTP, anything else (TLS alert, closed
// connection) means the port speaks TLS.

use glassadmin_core::domain::Scheme;
use glassadmin_core::port::ServerEntity;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

const SNIFF_REQUEST: &[u8] = b"HEAD / HTTP/1.0\r\n\r\n";
const HTTP_PREFIX: &[u8] = b"HTTP/";

/// Scheme to use for a server: the forced one, else detected
pub async fn resolve_scheme(server: &dyn ServerEntity, detect_timeout: Duration) -> Scheme {
    match server.admin_scheme() {
        Some(scheme) => scheme,
        None => detect_scheme(server.host(), server.admin_port(), detect_timeout).await,
    }
}

/// Ask `host:port`; unreachable ports default to plain HTTP so the real
/// request reports the connection error
pub async fn detect_scheme(host: &str, port: u16, detect_timeout: Duration) -> Scheme {
    let scheme = match timeout(detect_timeout, answers_http(host, port)).await {
        Ok(Ok(true)) => Scheme::Http,
        Ok(Ok(false)) => Scheme::Https,
        Ok(Err(_)) | Err(_) => Scheme::Http,
    };
    debug!(host = %host, port = %port, scheme = %scheme.as_str(), "Detected admin scheme");
    scheme
}

async fn answers_http(host: &str, port: u16) -> std::io::Result<bool> {
    let mut stream = TcpStream::connect((host, port)).await?;
    stream.write_all(SNIFF_REQUEST).await?;
    let mut head = [0u8; 5];
    let mut read = 0;
    while read < head.len() {
        let n = stream.read(&mut head[read..]).await?;
        if n == 0 {
            break;
        }
        read += n;
    }
    Ok(read == head.len() && head == HTTP_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_plain_http_detected() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 64];
            let _ = socket.read(&mut buf).await;
            socket.write_all(b"HTTP/1.0 200 OK\r\n\r\n").await.unwrap();
        });
        assert_eq!(detect_scheme("127.0.0.1", port, Duration::from_secs(2)).await, Scheme::Http);
    }

    #[tokio::test]
    async fn test_tls_alert_means_https() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 64];
            let _ = socket.read(&mut buf).await;
            // TLS alert record: handshake failure
            socket.write_all(&[0x15, 0x03, 0x03, 0x00, 0x02, 0x02, 0x28]).await.unwrap();
        });
        assert_eq!(detect_scheme("127.0.0.1", port, Duration::from_secs(2)).await, Scheme::Https);
    }
}
