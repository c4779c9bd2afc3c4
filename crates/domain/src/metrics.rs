/// Process-wide counters written by the decision engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryCounter {
    /// Every question that reached the decision engine.
    Received,
    /// Questions answered with the proxy's own address.
    Proxied,
}

impl QueryCounter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "dns_requests_received",
            Self::Proxied => "dns_requests_proxied",
        }
    }
}
