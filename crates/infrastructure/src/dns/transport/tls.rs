//! DNS-over-TLS upstream connection (RFC 7858)

use super::tcp::{connect_tcp, read_with_length_prefix, send_with_length_prefix};
use super::UpstreamConnection;
use async_trait::async_trait;
use rustls::pki_types::ServerName;
use sniproxy_dns_domain::DomainError;
use std::net::SocketAddr;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tracing::debug;

/// Shared TLS config, built once and reused across reconnects.
static SHARED_TLS_CONFIG: LazyLock<Arc<rustls::ClientConfig>> = LazyLock::new(|| {
    let mut root_store = rustls::RootCertStore::empty();
    root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    Arc::new(config)
});

pub struct TlsConnection {
    server_addr: SocketAddr,
    hostname: String,
    connect_timeout: Duration,
    stream: TlsStream<TcpStream>,
}

impl TlsConnection {
    pub async fn connect(
        server_addr: SocketAddr,
        hostname: String,
        timeout: Duration,
    ) -> Result<Self, DomainError> {
        let stream = Self::handshake(server_addr, &hostname, timeout).await?;
        Ok(Self {
            server_addr,
            hostname,
            connect_timeout: timeout,
            stream,
        })
    }

    /// TCP connect followed by the TLS handshake.
    async fn handshake(
        server_addr: SocketAddr,
        hostname: &str,
        timeout: Duration,
    ) -> Result<TlsStream<TcpStream>, DomainError> {
        let connector = tokio_rustls::TlsConnector::from(SHARED_TLS_CONFIG.clone());

        let server_name = ServerName::try_from(hostname.to_string()).map_err(|e| {
            DomainError::InvalidDomainName(format!("Invalid TLS hostname '{}': {}", hostname, e))
        })?;

        let tcp_stream = connect_tcp(server_addr, timeout).await?;

        let tls_stream = tokio::time::timeout(timeout, connector.connect(server_name, tcp_stream))
            .await
            .map_err(|_| DomainError::TransportTimeout {
                server: server_addr.to_string(),
            })?
            .map_err(|e| {
                DomainError::IoError(format!("TLS handshake failed with {}: {}", server_addr, e))
            })?;

        debug!(server = %server_addr, hostname = %hostname, "TLS connection established");
        Ok(tls_stream)
    }
}

#[async_trait]
impl UpstreamConnection for TlsConnection {
    async fn send(&mut self, message_bytes: &[u8]) -> Result<(), DomainError> {
        send_with_length_prefix(&mut self.stream, message_bytes, self.server_addr).await
    }

    async fn recv(&mut self) -> Result<Vec<u8>, DomainError> {
        let response = read_with_length_prefix(&mut self.stream, self.server_addr).await?;
        debug!(server = %self.server_addr, response_len = response.len(), "TLS response received");
        Ok(response)
    }

    async fn reconnect(&mut self) -> Result<(), DomainError> {
        self.stream =
            Self::handshake(self.server_addr, &self.hostname, self.connect_timeout).await?;
        Ok(())
    }

    fn protocol_name(&self) -> &'static str {
        "TLS"
    }

    fn is_stream(&self) -> bool {
        true
    }
}
