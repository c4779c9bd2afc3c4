#![allow(dead_code)]
use rcgen::{generate_simple_self_signed, CertifiedKey};
use rustls::pki_types::CertificateDer;
use std::path::PathBuf;
use tempfile::TempDir;

/// A throw-away certificate for `localhost`, written as PEM files.
pub struct TestCertificate {
    pub dir: TempDir,
    pub cert_path: String,
    pub key_path: String,
    pub cert_der: CertificateDer<'static>,
}

impl TestCertificate {
    pub fn generate() -> Self {
        let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

        let CertifiedKey { cert, key_pair } =
            generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();

        let dir = TempDir::new().unwrap();
        let cert_path = write(&dir, "cert.pem", &cert.pem());
        let key_path = write(&dir, "key.pem", &key_pair.serialize_pem());

        Self {
            dir,
            cert_path,
            key_path,
            cert_der: cert.der().clone(),
        }
    }

    pub fn write_file(&self, name: &str, contents: &str) -> String {
        write(&self.dir, name, contents)
    }
}

fn write(dir: &TempDir, name: &str, contents: &str) -> String {
    let path: PathBuf = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path.to_string_lossy().into_owned()
}
