use crate::ports::UpstreamResolver;
use hickory_proto::rr::{RData, RecordType};
use sniproxy_dns_domain::{to_fqdn, DomainError};
use std::net::Ipv4Addr;
use std::sync::Arc;
use tracing::debug;

/// Resolves a name to one IPv4 address through the upstream resolver,
/// following CNAME answers up to `max_chain` hops.
pub struct LookupAddressUseCase {
    upstream: Arc<dyn UpstreamResolver>,
    max_chain: usize,
}

impl LookupAddressUseCase {
    pub fn new(upstream: Arc<dyn UpstreamResolver>, max_chain: usize) -> Self {
        Self {
            upstream,
            max_chain,
        }
    }

    pub async fn execute(&self, domain: &str) -> Result<Ipv4Addr, DomainError> {
        let origin = to_fqdn(domain);
        let mut name = origin.clone();

        for _ in 0..=self.max_chain {
            let answer = self.upstream.query(&name, RecordType::A).await?;
            let first = answer
                .records
                .first()
                .ok_or_else(|| DomainError::EmptyResponse {
                    domain: name.clone(),
                })?;

            match first.data() {
                RData::A(a) => return Ok(a.0),
                RData::CNAME(cname) => {
                    debug!(domain = %name, target = %cname.0, "Following CNAME");
                    name = cname.0.to_ascii();
                }
                _ => {
                    return Err(DomainError::UnexpectedRecordType {
                        record_type: first.record_type().to_string(),
                    })
                }
            }
        }

        Err(DomainError::CnameChainTooLong {
            domain: origin,
            limit: self.max_chain,
        })
    }
}
