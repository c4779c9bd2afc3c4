use ipnetwork::IpNetwork;
use sniproxy_dns_application::ports::PolicyEngine;
use sniproxy_dns_domain::config::PolicyConfig;
use sniproxy_dns_domain::{ConnInfo, Decision};
use tracing::trace;

/// Static access-control policy built from the `[policy]` section.
///
/// Rules are checked in a fixed order: source network, override, reject,
/// forward, proxy, then the configured default.
pub struct DomainListPolicy {
    reject_sources: Vec<IpNetwork>,
    rules: Vec<(Decision, SuffixSet)>,
    default: Decision,
}

impl DomainListPolicy {
    pub fn from_config(config: &PolicyConfig) -> Self {
        let rules = vec![
            (Decision::Override, SuffixSet::new(&config.override_domains)),
            (Decision::Reject, SuffixSet::new(&config.reject_domains)),
            (Decision::Forward, SuffixSet::new(&config.forward_domains)),
            (Decision::ProxyIp, SuffixSet::new(&config.proxy_domains)),
        ];

        Self {
            reject_sources: config.reject_sources.clone(),
            rules,
            default: config.default,
        }
    }
}

impl PolicyEngine for DomainListPolicy {
    fn decide(&self, conn: &ConnInfo) -> Decision {
        let src = conn.src.ip();
        if self.reject_sources.iter().any(|net| net.contains(src)) {
            trace!(client = %src, "Source address in reject list");
            return Decision::Reject;
        }

        let domain = normalize(&conn.domain);
        self.rules
            .iter()
            .find(|(_, set)| set.matches(&domain))
            .map(|(decision, _)| *decision)
            .unwrap_or(self.default)
    }
}

/// Domain suffixes; an entry matches itself and all of its subdomains.
struct SuffixSet {
    suffixes: Vec<String>,
}

impl SuffixSet {
    fn new(entries: &[String]) -> Self {
        Self {
            suffixes: entries
                .iter()
                .map(|entry| normalize(entry))
                .filter(|entry| !entry.is_empty())
                .collect(),
        }
    }

    fn matches(&self, domain: &str) -> bool {
        self.suffixes.iter().any(|suffix| {
            domain == suffix
                || (domain.len() > suffix.len()
                    && domain.ends_with(suffix.as_str())
                    && domain.as_bytes()[domain.len() - suffix.len() - 1] == b'.')
        })
    }
}

fn normalize(name: &str) -> String {
    name.trim_end_matches('.').to_ascii_lowercase()
}
