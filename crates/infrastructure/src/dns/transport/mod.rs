pub mod tcp;
pub mod tls;
pub mod udp;

use async_trait::async_trait;
use sniproxy_dns_domain::{DomainError, UpstreamAddr, UpstreamProtocol};
use std::net::SocketAddr;
use std::time::Duration;

/// A stateful connection to the upstream resolver.
///
/// Implementations are driven by exactly one caller at a time; the
/// `UpstreamClient` owns the only handle behind its mutex.
#[async_trait]
pub trait UpstreamConnection: Send {
    /// Write one complete DNS message.
    async fn send(&mut self, message_bytes: &[u8]) -> Result<(), DomainError>;

    /// Read the next complete DNS message. A peer that closed the stream
    /// yields `DomainError::UpstreamClosed`.
    async fn recv(&mut self) -> Result<Vec<u8>, DomainError>;

    /// Replace the underlying socket with a fresh one, in place.
    async fn reconnect(&mut self) -> Result<(), DomainError>;

    fn protocol_name(&self) -> &'static str;

    /// Length-framed stream transports lose frame sync when a read is
    /// cancelled part way, so the client replaces them after a timeout.
    fn is_stream(&self) -> bool {
        false
    }
}

/// Open the connection described by `protocol`.
pub async fn connect(
    protocol: &UpstreamProtocol,
    timeout: Duration,
) -> Result<Box<dyn UpstreamConnection>, DomainError> {
    let server_addr = resolve_addr(protocol.addr()).await?;

    match protocol {
        UpstreamProtocol::Udp { .. } => Ok(Box::new(udp::UdpConnection::connect(server_addr).await?)),
        UpstreamProtocol::Tcp { .. } => Ok(Box::new(
            tcp::TcpConnection::connect(server_addr, timeout).await?,
        )),
        UpstreamProtocol::Tls { hostname, .. } => Ok(Box::new(
            tls::TlsConnection::connect(server_addr, hostname.to_string(), timeout).await?,
        )),
    }
}

async fn resolve_addr(addr: &UpstreamAddr) -> Result<SocketAddr, DomainError> {
    match addr {
        UpstreamAddr::Resolved(addr) => Ok(*addr),
        UpstreamAddr::Unresolved { hostname, port } => {
            tokio::net::lookup_host((hostname.as_ref(), *port))
                .await
                .map_err(|e| {
                    DomainError::InvalidDomainName(format!(
                        "Failed to resolve upstream {}: {}",
                        addr, e
                    ))
                })?
                .next()
                .ok_or_else(|| {
                    DomainError::InvalidDomainName(format!("No address found for upstream {}", addr))
                })
        }
    }
}
