use crate::ports::{MetricsSink, UpstreamResolver};
use hickory_proto::op::Query;
use hickory_proto::rr::rdata::{A, AAAA};
use hickory_proto::rr::{RData, Record, RecordType};
use sniproxy_dns_domain::{Decision, DomainError, QueryCounter};
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::Arc;
use tracing::{debug, info};

/// Public addresses advertised for names routed through the proxy.
#[derive(Debug, Clone, Copy)]
pub struct ProxyAnswers {
    pub ipv4: Option<Ipv4Addr>,
    pub ipv6: Option<Ipv6Addr>,
    pub ttl: u32,
}

/// Turns one question plus its policy decision into answer records.
pub struct ResolveQuestionUseCase {
    upstream: Arc<dyn UpstreamResolver>,
    metrics: Arc<dyn MetricsSink>,
    answers: ProxyAnswers,
}

impl ResolveQuestionUseCase {
    pub fn new(
        upstream: Arc<dyn UpstreamResolver>,
        metrics: Arc<dyn MetricsSink>,
        answers: ProxyAnswers,
    ) -> Self {
        Self {
            upstream,
            metrics,
            answers,
        }
    }

    pub async fn execute(
        &self,
        query: &Query,
        decision: Decision,
    ) -> Result<Vec<Record>, DomainError> {
        self.metrics.increment(QueryCounter::Received);
        let domain = query.name();

        match decision {
            Decision::ProxyIp | Decision::Override | Decision::Accept => {
                self.metrics.increment(QueryCounter::Proxied);
                info!(domain = %domain, decision = %decision, "Returned sniproxy address for domain");
                self.proxy_records(query)
            }
            Decision::Reject => {
                debug!(domain = %domain, "Rejected request for domain");
                Ok(vec![])
            }
            Decision::Forward => {
                debug!(domain = %domain, record_type = %query.query_type(), "Perform external query for domain");
                let answer = self
                    .upstream
                    .query(&domain.to_ascii(), query.query_type())
                    .await?;
                info!(
                    domain = %domain,
                    rtt = ?answer.rtt,
                    answers = answer.records.len(),
                    "Returned origin address for fqdn"
                );
                Ok(answer.records)
            }
        }
    }

    fn proxy_records(&self, query: &Query) -> Result<Vec<Record>, DomainError> {
        let name = query.name().clone();
        match query.query_type() {
            RecordType::A => {
                let ip = self.answers.ipv4.ok_or(DomainError::MissingPublicIpv4)?;
                Ok(vec![Record::from_rdata(name, self.answers.ttl, RData::A(A(ip)))])
            }
            // No IPv6 configured is a valid setup: answer with no records.
            RecordType::AAAA => Ok(self
                .answers
                .ipv6
                .map(|ip| vec![Record::from_rdata(name, self.answers.ttl, RData::AAAA(AAAA(ip)))])
                .unwrap_or_default()),
            _ => Ok(vec![]),
        }
    }
}
