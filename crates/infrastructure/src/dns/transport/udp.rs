//! UDP upstream connection (RFC 1035 §4.2.1)
//!
//! Messages are sent as-is on a connected socket. Datagrams never signal
//! end-of-stream, so this transport never asks for a reconnect by itself.

use super::UpstreamConnection;
use async_trait::async_trait;
use sniproxy_dns_domain::DomainError;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use tokio::net::UdpSocket;
use tracing::debug;

/// Maximum UDP DNS response size with EDNS(0)
const MAX_UDP_RESPONSE_SIZE: usize = 4096;

pub struct UdpConnection {
    server_addr: SocketAddr,
    socket: UdpSocket,
}

impl UdpConnection {
    pub async fn connect(server_addr: SocketAddr) -> Result<Self, DomainError> {
        let socket = Self::open_socket(server_addr).await?;
        Ok(Self {
            server_addr,
            socket,
        })
    }

    async fn open_socket(server_addr: SocketAddr) -> Result<UdpSocket, DomainError> {
        // Bind to ephemeral port (0 = OS assigns)
        let bind_addr: SocketAddr = if server_addr.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };

        let socket = UdpSocket::bind(bind_addr)
            .await
            .map_err(|e| DomainError::IoError(format!("Failed to bind UDP socket: {}", e)))?;

        // Connected sockets drop datagrams from any other source.
        socket.connect(server_addr).await.map_err(|e| {
            DomainError::IoError(format!(
                "Failed to connect UDP socket to {}: {}",
                server_addr, e
            ))
        })?;

        Ok(socket)
    }
}

#[async_trait]
impl UpstreamConnection for UdpConnection {
    async fn send(&mut self, message_bytes: &[u8]) -> Result<(), DomainError> {
        let bytes_sent = self.socket.send(message_bytes).await.map_err(|e| {
            DomainError::IoError(format!(
                "Failed to send UDP query to {}: {}",
                self.server_addr, e
            ))
        })?;

        debug!(server = %self.server_addr, bytes_sent, "UDP query sent");
        Ok(())
    }

    async fn recv(&mut self) -> Result<Vec<u8>, DomainError> {
        let mut recv_buf = vec![0u8; MAX_UDP_RESPONSE_SIZE];

        let bytes_received = self.socket.recv(&mut recv_buf).await.map_err(|e| {
            DomainError::IoError(format!(
                "Failed to receive UDP response from {}: {}",
                self.server_addr, e
            ))
        })?;

        recv_buf.truncate(bytes_received);
        debug!(server = %self.server_addr, bytes_received, "UDP response received");
        Ok(recv_buf)
    }

    async fn reconnect(&mut self) -> Result<(), DomainError> {
        self.socket = Self::open_socket(self.server_addr).await?;
        Ok(())
    }

    fn protocol_name(&self) -> &'static str {
        "UDP"
    }
}
