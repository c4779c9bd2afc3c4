use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, Ipv6Addr};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DnsConfig {
    /// Address returned for A questions the policy routes through the proxy.
    #[serde(default)]
    pub public_ipv4: Option<Ipv4Addr>,

    /// Address returned for AAAA questions; without it those answers are empty.
    #[serde(default)]
    pub public_ipv6: Option<Ipv6Addr>,

    #[serde(default = "default_upstream")]
    pub upstream: String,

    /// Upper bound for one upstream exchange, in milliseconds.
    #[serde(default = "default_query_timeout")]
    pub query_timeout: u64,

    #[serde(default = "default_max_cname_chain")]
    pub max_cname_chain: usize,

    /// TTL of the records synthesized for proxied names.
    #[serde(default = "default_answer_ttl")]
    pub answer_ttl: u32,
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            public_ipv4: None,
            public_ipv6: None,
            upstream: default_upstream(),
            query_timeout: default_query_timeout(),
            max_cname_chain: default_max_cname_chain(),
            answer_ttl: default_answer_ttl(),
        }
    }
}

fn default_upstream() -> String {
    "udp://1.1.1.1:53".to_string()
}

fn default_query_timeout() -> u64 {
    2000
}

fn default_max_cname_chain() -> usize {
    8
}

fn default_answer_ttl() -> u32 {
    3600
}
