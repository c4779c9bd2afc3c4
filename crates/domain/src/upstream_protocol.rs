use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

/// Upstream server address that may or may not be resolved to an IP.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UpstreamAddr {
    Resolved(SocketAddr),
    Unresolved { hostname: Arc<str>, port: u16 },
}

impl UpstreamAddr {
    pub fn port(&self) -> u16 {
        match self {
            UpstreamAddr::Resolved(addr) => addr.port(),
            UpstreamAddr::Unresolved { port, .. } => *port,
        }
    }
}

impl fmt::Display for UpstreamAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpstreamAddr::Resolved(addr) => write!(f, "{}", addr),
            UpstreamAddr::Unresolved { hostname, port } => write!(f, "{}:{}", hostname, port),
        }
    }
}

/// Transport used to reach the upstream resolver.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UpstreamProtocol {
    Udp { addr: UpstreamAddr },
    Tcp { addr: UpstreamAddr },
    Tls { addr: UpstreamAddr, hostname: Arc<str> },
}

impl UpstreamProtocol {
    pub fn addr(&self) -> &UpstreamAddr {
        match self {
            UpstreamProtocol::Udp { addr }
            | UpstreamProtocol::Tcp { addr }
            | UpstreamProtocol::Tls { addr, .. } => addr,
        }
    }
}

fn parse_host_port(s: &str) -> Option<(&str, u16)> {
    if s.starts_with('[') {
        let end = s.find(']')?;
        let host = &s[1..end];
        let port = s[end + 1..].strip_prefix(':')?.parse::<u16>().ok()?;
        Some((host, port))
    } else {
        let (host, port_str) = s.rsplit_once(':')?;
        let port = port_str.parse::<u16>().ok()?;
        Some((host, port))
    }
}

fn parse_upstream_addr(addr_str: &str) -> Result<UpstreamAddr, String> {
    if let Ok(addr) = addr_str.parse::<SocketAddr>() {
        return Ok(UpstreamAddr::Resolved(addr));
    }
    match parse_host_port(addr_str) {
        Some((host, port)) if !host.is_empty() => Ok(UpstreamAddr::Unresolved {
            hostname: host.into(),
            port,
        }),
        _ => Err(format!("Invalid address '{}'", addr_str)),
    }
}

impl FromStr for UpstreamProtocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(addr_str) = s.strip_prefix("udp://") {
            let addr = parse_upstream_addr(addr_str)
                .map_err(|_| format!("Invalid UDP address '{}'", addr_str))?;
            return Ok(UpstreamProtocol::Udp { addr });
        }
        if let Some(addr_str) = s.strip_prefix("tcp://") {
            let addr = parse_upstream_addr(addr_str)
                .map_err(|_| format!("Invalid TCP address '{}'", addr_str))?;
            return Ok(UpstreamProtocol::Tcp { addr });
        }
        if let Some(rest) = s.strip_prefix("tls://") {
            let addr = parse_upstream_addr(rest).map_err(|_| {
                format!(
                    "Invalid TLS format '{}'. Expected 'tls://IP:PORT' or 'tls://HOSTNAME:PORT'",
                    s
                )
            })?;
            let hostname: Arc<str> = match &addr {
                UpstreamAddr::Resolved(sock) => sock.ip().to_string().into(),
                UpstreamAddr::Unresolved { hostname, .. } => hostname.clone(),
            };
            return Ok(UpstreamProtocol::Tls { addr, hostname });
        }
        if !s.contains("://") {
            if let Ok(addr) = parse_upstream_addr(s) {
                return Ok(UpstreamProtocol::Udp { addr });
            }
        }
        Err(format!(
            "Invalid upstream format: '{}'. Expected: udp://HOST:PORT, tcp://HOST:PORT, tls://HOST:PORT, or HOST:PORT",
            s
        ))
    }
}

impl fmt::Display for UpstreamProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpstreamProtocol::Udp { addr } => write!(f, "udp://{}", addr),
            UpstreamProtocol::Tcp { addr } => write!(f, "tcp://{}", addr),
            UpstreamProtocol::Tls { addr, hostname } => {
                write!(f, "tls://{}:{}", hostname, addr.port())
            }
        }
    }
}
