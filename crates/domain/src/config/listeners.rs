use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Bind addresses of the inbound DNS transports. Each one is optional; a
/// missing `[listeners]` section enables plain UDP on port 53 only.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ListenersConfig {
    #[serde(default)]
    pub udp: Option<SocketAddr>,

    #[serde(default)]
    pub tcp: Option<SocketAddr>,

    #[serde(default)]
    pub tls: Option<SocketAddr>,

    #[serde(default)]
    pub quic: Option<SocketAddr>,

    /// Idle timeout for TCP and TLS client connections, in seconds.
    #[serde(default = "default_tcp_timeout")]
    pub tcp_timeout: u64,
}

impl ListenersConfig {
    pub fn any_enabled(&self) -> bool {
        self.udp.is_some() || self.tcp.is_some() || self.tls.is_some() || self.quic.is_some()
    }
}

impl Default for ListenersConfig {
    fn default() -> Self {
        Self {
            udp: default_udp(),
            tcp: None,
            tls: None,
            quic: None,
            tcp_timeout: default_tcp_timeout(),
        }
    }
}

fn default_udp() -> Option<SocketAddr> {
    Some(SocketAddr::from(([0, 0, 0, 0], 53)))
}

fn default_tcp_timeout() -> u64 {
    10
}
