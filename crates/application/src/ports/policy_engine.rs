use sniproxy_dns_domain::{ConnInfo, Decision};

/// Access-control policy consulted once per question.
pub trait PolicyEngine: Send + Sync {
    fn decide(&self, conn: &ConnInfo) -> Decision;
}
