use std::net::SocketAddr;
use std::sync::Arc;

/// Connection metadata handed to the policy engine for each question.
#[derive(Debug, Clone)]
pub struct ConnInfo {
    pub src: SocketAddr,
    pub domain: Arc<str>,
}

impl ConnInfo {
    pub fn new(src: SocketAddr, domain: impl Into<Arc<str>>) -> Self {
        Self {
            src,
            domain: domain.into(),
        }
    }
}
