use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid domain name: {0}")]
    InvalidDomainName(String),

    #[error("Invalid DNS response: {0}")]
    InvalidDnsResponse(String),

    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Query timeout")]
    QueryTimeout,

    #[error("dns client is not initialised")]
    UpstreamNotInitialized,

    /// The upstream peer closed the stream (end of file).
    #[error("EOF from upstream {server}")]
    UpstreamClosed { server: String },

    #[error("Transport timeout connecting to {server}")]
    TransportTimeout { server: String },

    #[error("Transport connection refused by {server}")]
    TransportConnectionRefused { server: String },

    #[error("no public IPv4 address configured")]
    MissingPublicIpv4,

    #[error("[DNS] Empty DNS response for {domain}")]
    EmptyResponse { domain: String },

    #[error("[DNS] Unknown type {record_type}")]
    UnexpectedRecordType { record_type: String },

    #[error("[DNS] CNAME chain for {domain} exceeds {limit} hops")]
    CnameChainTooLong { domain: String, limit: usize },
}

impl DomainError {
    /// True for the end-of-stream condition that warrants a reconnect.
    pub fn is_connection_closed(&self) -> bool {
        matches!(self, DomainError::UpstreamClosed { .. })
    }
}
