use super::ResolveQuestionUseCase;
use crate::ports::PolicyEngine;
use hickory_proto::op::{OpCode, Query, ResponseCode};
use hickory_proto::rr::Record;
use sniproxy_dns_domain::ConnInfo;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::warn;

/// Response code and answer section assembled for one inbound message.
#[derive(Debug, Clone)]
pub struct DnsReply {
    pub response_code: ResponseCode,
    pub answers: Vec<Record>,
}

impl DnsReply {
    fn not_implemented() -> Self {
        Self {
            response_code: ResponseCode::NotImp,
            answers: vec![],
        }
    }
}

/// Entry point shared by every transport listener.
pub struct HandleDnsMessageUseCase {
    policy: Arc<dyn PolicyEngine>,
    resolver: Arc<ResolveQuestionUseCase>,
}

impl HandleDnsMessageUseCase {
    pub fn new(policy: Arc<dyn PolicyEngine>, resolver: Arc<ResolveQuestionUseCase>) -> Self {
        Self { policy, resolver }
    }

    pub async fn execute(&self, src: SocketAddr, op_code: OpCode, queries: &[Query]) -> DnsReply {
        if op_code != OpCode::Query {
            return DnsReply::not_implemented();
        }

        let mut answers = Vec::new();

        for query in queries {
            let conn = ConnInfo::new(src, query.name().to_ascii());
            let decision = self.policy.decide(&conn);

            // A failed question only loses its own answers.
            match self.resolver.execute(query, decision).await {
                Ok(records) => answers.extend(records),
                Err(e) => {
                    warn!(
                        domain = %conn.domain,
                        client = %src,
                        decision = %decision,
                        error = %e,
                        "Question left unanswered"
                    );
                }
            }
        }

        DnsReply {
            response_code: ResponseCode::NoError,
            answers,
        }
    }
}
