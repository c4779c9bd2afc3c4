//! DNS-over-QUIC relay (RFC 9250)
//!
//! Every bidirectional stream carries one length-prefixed DNS message. The
//! message is relayed over plain UDP to this service's own UDP listener and
//! the reply is written back on the same stream.

use super::listener::{ListenerError, ListenerTransport};
use super::transport::tcp::{read_with_length_prefix, send_with_length_prefix};
use super::transport::udp::UdpConnection;
use super::transport::UpstreamConnection;
use crate::tls::TlsMaterial;
use quinn::crypto::rustls::QuicServerConfig;
use sniproxy_dns_domain::DomainError;
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// RFC 9250 identifier followed by the draft identifiers older clients offer.
pub const DOQ_ALPN: [&[u8]; 4] = [b"doq", b"doq-i02", b"doq-i00", b"dq"];

pub struct DoqRelay {
    endpoint: quinn::Endpoint,
    backend: SocketAddr,
    timeout: Duration,
}

impl DoqRelay {
    /// Binds the QUIC endpoint. `udp_listener` is the address of the plain
    /// UDP listener that answers the relayed messages.
    pub fn bind(
        addr: SocketAddr,
        material: &TlsMaterial,
        udp_listener: SocketAddr,
        timeout: Duration,
    ) -> Result<Self, ListenerError> {
        let tls_config = material.server_config(&DOQ_ALPN)?;
        let crypto = QuicServerConfig::try_from(tls_config.as_ref().clone())
            .map_err(|e| ListenerError::Quic(e.to_string()))?;
        let server_config = quinn::ServerConfig::with_crypto(Arc::new(crypto));

        let endpoint =
            quinn::Endpoint::server(server_config, addr).map_err(|source| ListenerError::Bind {
                transport: ListenerTransport::Quic,
                addr,
                source,
            })?;

        Ok(Self {
            endpoint,
            backend: backend_addr(udp_listener),
            timeout,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.endpoint.local_addr()
    }

    pub fn backend(&self) -> SocketAddr {
        self.backend
    }

    /// Accepts connections until the endpoint is closed.
    pub async fn run(self) {
        while let Some(incoming) = self.endpoint.accept().await {
            let backend = self.backend;
            let timeout = self.timeout;
            tokio::spawn(async move {
                let remote = incoming.remote_address();
                match incoming.await {
                    Ok(connection) => handle_connection(connection, backend, timeout).await,
                    Err(e) => debug!(client = %remote, error = %e, "QUIC handshake failed"),
                }
            });
        }
        info!("DNS-over-QUIC listener stopped");
    }
}

/// The relay target: the UDP listener, with a wildcard address replaced by
/// loopback of the same family.
pub fn backend_addr(udp_listener: SocketAddr) -> SocketAddr {
    let ip = match udp_listener.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
        IpAddr::V6(ip) if ip.is_unspecified() => IpAddr::V6(Ipv6Addr::LOCALHOST),
        ip => ip,
    };
    SocketAddr::new(ip, udp_listener.port())
}

async fn handle_connection(connection: quinn::Connection, backend: SocketAddr, timeout: Duration) {
    let remote = connection.remote_address();
    debug!(client = %remote, "QUIC connection established");

    loop {
        match connection.accept_bi().await {
            Ok((send, recv)) => {
                tokio::spawn(async move {
                    if let Err(e) = relay_stream(send, recv, backend, timeout).await {
                        warn!(client = %remote, error = %e, "DNS-over-QUIC stream failed");
                    }
                });
            }
            Err(e) => {
                debug!(client = %remote, error = %e, "QUIC connection closed");
                break;
            }
        }
    }
}

async fn relay_stream(
    mut send: quinn::SendStream,
    mut recv: quinn::RecvStream,
    backend: SocketAddr,
    timeout: Duration,
) -> Result<(), DomainError> {
    let query = read_with_length_prefix(&mut recv, backend).await?;

    let response = tokio::time::timeout(timeout, relay_udp(&query, backend))
        .await
        .map_err(|_| DomainError::QueryTimeout)??;

    send_with_length_prefix(&mut send, &response, backend).await?;
    send.finish()
        .map_err(|e| DomainError::IoError(format!("Failed to finish QUIC stream: {}", e)))?;
    Ok(())
}

async fn relay_udp(query: &[u8], backend: SocketAddr) -> Result<Vec<u8>, DomainError> {
    let mut connection = UdpConnection::connect(backend).await?;
    connection.send(query).await?;
    connection.recv().await
}
