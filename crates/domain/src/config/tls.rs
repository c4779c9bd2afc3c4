use serde::{Deserialize, Serialize};

/// Certificate material shared by the DNS-over-TLS and DNS-over-QUIC listeners.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TlsConfig {
    /// PEM certificate chain.
    #[serde(default)]
    pub cert: Option<String>,

    /// PEM private key (PKCS#8, PKCS#1 or SEC1).
    #[serde(default)]
    pub key: Option<String>,
}

impl TlsConfig {
    pub fn paths(&self) -> Option<(&str, &str)> {
        match (&self.cert, &self.key) {
            (Some(cert), Some(key)) => Some((cert.as_str(), key.as_str())),
            _ => None,
        }
    }
}
