//! Certificate loading for the DNS-over-TLS and DNS-over-QUIC listeners.

use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::ServerConfig;
use std::fs;
use std::io::Cursor;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum TlsError {
    #[error("Failed to read {path}: {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse certificate: {0}")]
    CertificateParse(String),

    #[error("Failed to parse private key: {0}")]
    PrivateKeyParse(String),

    #[error("No certificate found in {0}")]
    NoCertificate(String),

    #[error("No private key found in {0}")]
    NoPrivateKey(String),

    #[error("TLS configuration error: {0}")]
    Config(#[from] rustls::Error),
}

/// Certificate chain and key, read once at start-up and shared by the
/// TLS and QUIC listeners.
#[derive(Debug)]
pub struct TlsMaterial {
    certs: Vec<CertificateDer<'static>>,
    key: PrivateKeyDer<'static>,
}

impl TlsMaterial {
    pub fn load(cert_path: &str, key_path: &str) -> Result<Self, TlsError> {
        let certs = load_certificates(cert_path)?;
        let key = load_private_key(key_path)?;
        Ok(Self { certs, key })
    }

    pub fn cert_count(&self) -> usize {
        self.certs.len()
    }

    /// rustls server configuration advertising `alpn` (may be empty).
    pub fn server_config(&self, alpn: &[&[u8]]) -> Result<Arc<ServerConfig>, TlsError> {
        let mut config = ServerConfig::builder()
            .with_no_client_auth()
            .with_single_cert(self.certs.clone(), self.key.clone_key())?;

        config.alpn_protocols = alpn.iter().map(|proto| proto.to_vec()).collect();
        Ok(Arc::new(config))
    }
}

fn read_file(path: &str) -> Result<Vec<u8>, TlsError> {
    fs::read(path).map_err(|source| TlsError::FileRead {
        path: path.to_string(),
        source,
    })
}

fn load_certificates(path: &str) -> Result<Vec<CertificateDer<'static>>, TlsError> {
    debug!(path, "Loading TLS certificate");

    let data = read_file(path)?;
    let mut cursor = Cursor::new(data);
    let certs: Vec<CertificateDer<'static>> = rustls_pemfile::certs(&mut cursor)
        .collect::<Result<_, _>>()
        .map_err(|e| TlsError::CertificateParse(e.to_string()))?;

    if certs.is_empty() {
        return Err(TlsError::NoCertificate(path.to_string()));
    }

    info!(path, count = certs.len(), "Loaded TLS certificate chain");
    Ok(certs)
}

fn load_private_key(path: &str) -> Result<PrivateKeyDer<'static>, TlsError> {
    debug!(path, "Loading private key");

    let data = read_file(path)?;
    let mut cursor = Cursor::new(data);

    // Accepts PKCS#8, PKCS#1 and SEC1 blocks.
    rustls_pemfile::private_key(&mut cursor)
        .map_err(|e| TlsError::PrivateKeyParse(e.to_string()))?
        .ok_or_else(|| TlsError::NoPrivateKey(path.to_string()))
}
