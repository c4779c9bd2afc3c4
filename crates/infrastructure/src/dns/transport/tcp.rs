use super::UpstreamConnection;
use async_trait::async_trait;
use sniproxy_dns_domain::DomainError;
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

/// Persistent TCP connection with 2-byte length framing (RFC 1035 §4.2.2).
pub struct TcpConnection {
    server_addr: SocketAddr,
    connect_timeout: Duration,
    stream: TcpStream,
}

impl TcpConnection {
    pub async fn connect(server_addr: SocketAddr, timeout: Duration) -> Result<Self, DomainError> {
        let stream = connect_tcp(server_addr, timeout).await?;
        Ok(Self {
            server_addr,
            connect_timeout: timeout,
            stream,
        })
    }
}

#[async_trait]
impl UpstreamConnection for TcpConnection {
    async fn send(&mut self, message_bytes: &[u8]) -> Result<(), DomainError> {
        send_with_length_prefix(&mut self.stream, message_bytes, self.server_addr).await?;
        debug!(server = %self.server_addr, message_len = message_bytes.len(), "TCP query sent");
        Ok(())
    }

    async fn recv(&mut self) -> Result<Vec<u8>, DomainError> {
        let response = read_with_length_prefix(&mut self.stream, self.server_addr).await?;
        debug!(server = %self.server_addr, response_len = response.len(), "TCP response received");
        Ok(response)
    }

    async fn reconnect(&mut self) -> Result<(), DomainError> {
        self.stream = connect_tcp(self.server_addr, self.connect_timeout).await?;
        Ok(())
    }

    fn protocol_name(&self) -> &'static str {
        "TCP"
    }

    fn is_stream(&self) -> bool {
        true
    }
}

pub(crate) async fn connect_tcp(
    server_addr: SocketAddr,
    timeout: Duration,
) -> Result<TcpStream, DomainError> {
    let stream = tokio::time::timeout(timeout, TcpStream::connect(server_addr))
        .await
        .map_err(|_| DomainError::TransportTimeout {
            server: server_addr.to_string(),
        })?
        .map_err(|e| {
            debug!(server = %server_addr, error = %e, "TCP connect failed");
            DomainError::TransportConnectionRefused {
                server: server_addr.to_string(),
            }
        })?;

    stream.set_nodelay(true).map_err(|e| {
        DomainError::IoError(format!(
            "Failed to set TCP_NODELAY on {}: {}",
            server_addr, e
        ))
    })?;

    Ok(stream)
}

fn is_closed(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::UnexpectedEof
            | ErrorKind::BrokenPipe
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
    )
}

fn map_io_error(e: std::io::Error, server_addr: SocketAddr, context: &str) -> DomainError {
    if is_closed(e.kind()) {
        DomainError::UpstreamClosed {
            server: server_addr.to_string(),
        }
    } else {
        DomainError::IoError(format!("{} ({}): {}", context, server_addr, e))
    }
}

pub(crate) async fn send_with_length_prefix<S>(
    stream: &mut S,
    message_bytes: &[u8],
    server_addr: SocketAddr,
) -> Result<(), DomainError>
where
    S: AsyncWriteExt + Unpin,
{
    let length = u16::try_from(message_bytes.len()).map_err(|_| {
        DomainError::InvalidDnsResponse(format!(
            "Message too large for TCP framing: {} bytes",
            message_bytes.len()
        ))
    })?;

    let mut framed = Vec::with_capacity(message_bytes.len() + 2);
    framed.extend_from_slice(&length.to_be_bytes());
    framed.extend_from_slice(message_bytes);

    stream
        .write_all(&framed)
        .await
        .map_err(|e| map_io_error(e, server_addr, "Failed to write DNS message"))?;
    stream
        .flush()
        .await
        .map_err(|e| map_io_error(e, server_addr, "Failed to flush stream"))?;

    Ok(())
}

pub(crate) async fn read_with_length_prefix<S>(
    stream: &mut S,
    server_addr: SocketAddr,
) -> Result<Vec<u8>, DomainError>
where
    S: AsyncReadExt + Unpin,
{
    let mut len_buf = [0u8; 2];
    stream
        .read_exact(&mut len_buf)
        .await
        .map_err(|e| map_io_error(e, server_addr, "Failed to read response length"))?;

    let response_len = usize::from(u16::from_be_bytes(len_buf));

    let mut response = vec![0u8; response_len];
    stream
        .read_exact(&mut response)
        .await
        .map_err(|e| map_io_error(e, server_addr, "Failed to read response body"))?;

    Ok(response)
}
