use crate::Decision;
use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};

/// Static rule lists for the built-in domain-list policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PolicyConfig {
    /// Decision for names no rule matches.
    #[serde(default = "default_decision")]
    pub default: Decision,

    #[serde(default)]
    pub proxy_domains: Vec<String>,

    #[serde(default)]
    pub reject_domains: Vec<String>,

    #[serde(default)]
    pub forward_domains: Vec<String>,

    #[serde(default)]
    pub override_domains: Vec<String>,

    /// Client networks whose queries are always rejected.
    #[serde(default)]
    pub reject_sources: Vec<IpNetwork>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            default: default_decision(),
            proxy_domains: vec![],
            reject_domains: vec![],
            forward_domains: vec![],
            override_domains: vec![],
            reject_sources: vec![],
        }
    }
}

impl PolicyConfig {
    /// Whether any rule, or the fallthrough, answers with the proxy address.
    pub fn can_proxy(&self) -> bool {
        self.default.answers_with_proxy()
            || !self.proxy_domains.is_empty()
            || !self.override_domains.is_empty()
    }
}

fn default_decision() -> Decision {
    Decision::ProxyIp
}
