use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of the access-control policy for one question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// Answer with the proxy's own public address.
    #[serde(rename = "proxy")]
    ProxyIp,

    /// Forced proxy answer coming from an override rule.
    Override,

    /// Connection is accepted; for DNS this behaves like `ProxyIp`.
    Accept,

    /// Answer with an empty record set.
    Reject,

    /// Relay the question to the upstream resolver.
    #[default]
    Forward,
}

impl Decision {
    /// Whether the answer is synthesized from the proxy's public addresses.
    pub fn answers_with_proxy(&self) -> bool {
        matches!(self, Self::ProxyIp | Self::Override | Self::Accept)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProxyIp => "proxy",
            Self::Override => "override",
            Self::Accept => "accept",
            Self::Reject => "reject",
            Self::Forward => "forward",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
