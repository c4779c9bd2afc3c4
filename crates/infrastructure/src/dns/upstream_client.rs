use super::forwarding::{MessageBuilder, ResponseParser};
use super::transport::{self, UpstreamConnection};
use async_trait::async_trait;
use hickory_proto::op::ResponseCode;
use hickory_proto::rr::RecordType;
use sniproxy_dns_application::ports::{UpstreamAnswer, UpstreamResolver};
use sniproxy_dns_domain::{to_fqdn, DomainError, UpstreamProtocol};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Client for the single upstream resolver connection.
///
/// One mutex covers the whole exchange and any reconnect, so forwarded
/// queries are serialized process-wide and the connection is never used
/// concurrently.
pub struct UpstreamClient {
    server: String,
    timeout: Duration,
    connection: Mutex<Option<Box<dyn UpstreamConnection>>>,
}

impl UpstreamClient {
    /// Connects to `protocol` and returns a ready client.
    pub async fn connect(protocol: &UpstreamProtocol, timeout: Duration) -> Result<Self, DomainError> {
        let connection = transport::connect(protocol, timeout).await?;
        info!(
            upstream = %protocol,
            protocol = connection.protocol_name(),
            "Connected to upstream resolver"
        );
        Ok(Self::with_connection(protocol.to_string(), connection, timeout))
    }

    pub fn with_connection(
        server: impl Into<String>,
        connection: Box<dyn UpstreamConnection>,
        timeout: Duration,
    ) -> Self {
        Self {
            server: server.into(),
            timeout,
            connection: Mutex::new(Some(connection)),
        }
    }

    /// A client with no connection yet; queries fail until `install` is called.
    pub fn disconnected(server: impl Into<String>, timeout: Duration) -> Self {
        Self {
            server: server.into(),
            timeout,
            connection: Mutex::new(None),
        }
    }

    pub async fn install(&self, connection: Box<dyn UpstreamConnection>) {
        *self.connection.lock().await = Some(connection);
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    /// Sends `request` and waits for the response carrying the same id.
    async fn exchange(
        connection: &mut dyn UpstreamConnection,
        id: u16,
        request: &[u8],
    ) -> Result<Vec<u8>, DomainError> {
        connection.send(request).await?;

        loop {
            let response = connection.recv().await?;
            match ResponseParser::peek_id(&response) {
                Some(response_id) if response_id == id => return Ok(response),
                other => {
                    debug!(expected = id, received = ?other, "Discarding response with mismatched id");
                }
            }
        }
    }
}

#[async_trait]
impl UpstreamResolver for UpstreamClient {
    async fn query(
        &self,
        name: &str,
        record_type: RecordType,
    ) -> Result<UpstreamAnswer, DomainError> {
        let fqdn = to_fqdn(name);
        let (id, request) = MessageBuilder::build_query(&fqdn, record_type)?;

        let mut guard = self.connection.lock().await;
        let connection = guard.as_mut().ok_or(DomainError::UpstreamNotInitialized)?;

        let start = Instant::now();
        let result = tokio::time::timeout(
            self.timeout,
            Self::exchange(connection.as_mut(), id, &request),
        )
        .await;

        let response = match result {
            Ok(Ok(response)) => response,
            Ok(Err(e)) if e.is_connection_closed() => {
                warn!(upstream = %self.server, error = %e, "Upstream closed the connection, reconnecting");
                if let Err(reconnect_err) = connection.reconnect().await {
                    error!(upstream = %self.server, error = %reconnect_err, "Failed to reconnect to upstream");
                }
                return Err(e);
            }
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                debug!(upstream = %self.server, domain = %fqdn, timeout = ?self.timeout, "Upstream query timed out");
                if connection.is_stream() {
                    warn!(upstream = %self.server, "Dropping upstream stream after timeout, reconnecting");
                    if let Err(reconnect_err) = connection.reconnect().await {
                        error!(upstream = %self.server, error = %reconnect_err, "Failed to reconnect to upstream");
                    }
                }
                return Err(DomainError::QueryTimeout);
            }
        };
        let rtt = start.elapsed();
        drop(guard);

        let parsed = ResponseParser::parse(&response)?;
        if parsed.rcode != ResponseCode::NoError {
            debug!(upstream = %self.server, domain = %fqdn, rcode = %parsed.rcode, "Upstream answered with error code");
        }
        if parsed.truncated {
            debug!(upstream = %self.server, domain = %fqdn, "Upstream response truncated");
        }

        Ok(UpstreamAnswer::new(parsed.answers, rtt))
    }
}
