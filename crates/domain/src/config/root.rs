use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};

use super::dns::DnsConfig;
use super::errors::ConfigError;
use super::listeners::ListenersConfig;
use super::logging::LoggingConfig;
use super::policy::PolicyConfig;
use super::tls::TlsConfig;
use crate::UpstreamProtocol;

const LOCAL_CONFIG_PATH: &str = "sniproxy-dns.toml";
const SYSTEM_CONFIG_PATH: &str = "/etc/sniproxy-dns/config.toml";

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Public addresses, upstream resolver and resolution limits
    #[serde(default)]
    pub dns: DnsConfig,

    /// Inbound transport bind addresses
    #[serde(default)]
    pub listeners: ListenersConfig,

    /// Certificate material for DoT / DoQ
    #[serde(default)]
    pub tls: TlsConfig,

    /// Built-in access-control lists
    #[serde(default)]
    pub policy: PolicyConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file or use defaults
    ///
    /// Priority order:
    /// 1. Explicitly provided path
    /// 2. sniproxy-dns.toml in current directory
    /// 3. /etc/sniproxy-dns/config.toml
    /// 4. Default configuration
    pub fn load(path: Option<&str>, cli_overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = path {
            Self::from_file(path)?
        } else if std::path::Path::new(LOCAL_CONFIG_PATH).exists() {
            Self::from_file(LOCAL_CONFIG_PATH)?
        } else if std::path::Path::new(SYSTEM_CONFIG_PATH).exists() {
            Self::from_file(SYSTEM_CONFIG_PATH)?
        } else {
            Self::default()
        };

        config.apply_cli_overrides(cli_overrides);
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn apply_cli_overrides(&mut self, overrides: CliOverrides) {
        if let Some(upstream) = overrides.upstream {
            self.dns.upstream = upstream;
        }
        if let Some(ip) = overrides.public_ipv4 {
            self.dns.public_ipv4 = Some(ip);
        }
        if let Some(bind) = overrides.bind_udp {
            self.listeners.udp = Some(bind);
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    /// Parsed upstream endpoint.
    pub fn upstream_protocol(&self) -> Result<UpstreamProtocol, ConfigError> {
        self.dns
            .upstream
            .parse::<UpstreamProtocol>()
            .map_err(ConfigError::Validation)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.upstream_protocol()?;

        if self.dns.query_timeout == 0 {
            return Err(ConfigError::Validation(
                "dns.query_timeout cannot be 0".to_string(),
            ));
        }

        if self.dns.max_cname_chain == 0 {
            return Err(ConfigError::Validation(
                "dns.max_cname_chain cannot be 0".to_string(),
            ));
        }

        if self.dns.public_ipv4.is_none() && self.policy.can_proxy() {
            return Err(ConfigError::Validation(
                "dns.public_ipv4 is required when the policy can answer with the proxy address"
                    .to_string(),
            ));
        }

        if !self.listeners.any_enabled() {
            return Err(ConfigError::Validation(
                "No DNS listener configured".to_string(),
            ));
        }

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            return Err(ConfigError::Validation(format!(
                "logging.format must be \"text\" or \"json\", got \"{}\"",
                self.logging.format
            )));
        }

        let needs_cert = self.listeners.tls.is_some() || self.listeners.quic.is_some();
        if needs_cert && self.tls.paths().is_none() {
            return Err(ConfigError::Validation(
                "tls.cert and tls.key are required for DNS-over-TLS and DNS-over-QUIC".to_string(),
            ));
        }

        Ok(())
    }
}

/// Command-line overrides for configuration
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub upstream: Option<String>,
    pub public_ipv4: Option<Ipv4Addr>,
    pub bind_udp: Option<SocketAddr>,
    pub log_level: Option<String>,
}
