use async_trait::async_trait;
use hickory_proto::rr::{Record, RecordType};
use sniproxy_dns_domain::DomainError;
use std::time::Duration;

/// Answer section of one upstream exchange.
#[derive(Debug, Clone)]
pub struct UpstreamAnswer {
    pub records: Vec<Record>,
    pub rtt: Duration,
}

impl UpstreamAnswer {
    pub fn new(records: Vec<Record>, rtt: Duration) -> Self {
        Self { records, rtt }
    }
}

#[async_trait]
pub trait UpstreamResolver: Send + Sync {
    /// Sends one recursive question for `name` (made fully qualified) to the
    /// upstream resolver and returns its answer records.
    async fn query(&self, name: &str, record_type: RecordType)
        -> Result<UpstreamAnswer, DomainError>;
}
