//! TLS configuration and certificate loading.
//!
//! The certificate and key are read once at startup into a single rustls
//! server config. The HTTPS listener and the raw TLS listener both hold an
//! `Arc` to it.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum_server::tls_rustls::RustlsConfig;
use tokio_rustls::rustls::crypto::aws_lc_rs;
use tokio_rustls::rustls::pki_types::{CertificateDer, PrivateKeyDer};
use tokio_rustls::rustls::ServerConfig;
use tokio_rustls::TlsAcceptor;

/// Errors loading TLS material. All of them are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    #[error("certificate file not found: {0:?}")]
    CertificateNotFound(PathBuf),

    #[error("private key file not found: {0:?}")]
    KeyNotFound(PathBuf),

    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no certificates found in {0:?}")]
    NoCertificates(PathBuf),

    #[error("no private key found in {0:?}")]
    NoPrivateKey(PathBuf),

    #[error("invalid TLS configuration: {0}")]
    Rustls(#[from] tokio_rustls::rustls::Error),
}

/// Certificate chain and private key, parsed once and shared read-only.
#[derive(Clone)]
pub struct TlsMaterial {
    server_config: Arc<ServerConfig>,
}

impl std::fmt::Debug for TlsMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsMaterial").finish_non_exhaustive()
    }
}

impl TlsMaterial {
    /// Load TLS material from certificate and key files.
    pub fn load(cert_path: &Path, key_path: &Path) -> Result<Self, TlsError> {
        // Basic validation
        if !cert_path.exists() {
            return Err(TlsError::CertificateNotFound(cert_path.to_path_buf()));
        }
        if !key_path.exists() {
            return Err(TlsError::KeyNotFound(key_path.to_path_buf()));
        }

        let certs = read_certs(cert_path)?;
        let key = read_key(key_path)?;
        let material = Self::from_parts(certs, key)?;

        tracing::info!(cert = ?cert_path, key = ?key_path, "TLS material loaded");
        Ok(material)
    }

    /// Build TLS material from an already parsed chain and key.
    pub fn from_parts(
        certs: Vec<CertificateDer<'static>>,
        key: PrivateKeyDer<'static>,
    ) -> Result<Self, TlsError> {
        let server_config = ServerConfig::builder_with_provider(Arc::new(aws_lc_rs::default_provider()))
            .with_safe_default_protocol_versions()?
            .with_no_client_auth()
            .with_single_cert(certs, key)?;

        Ok(Self {
            server_config: Arc::new(server_config),
        })
    }

    /// Acceptor for raw TLS streams.
    pub fn acceptor(&self) -> TlsAcceptor {
        TlsAcceptor::from(Arc::clone(&self.server_config))
    }

    /// Server config for HTTPS, advertising h2 and http/1.1 over ALPN.
    ///
    /// The clone shares the certificate resolver with the raw TLS acceptor.
    pub fn https_config(&self) -> RustlsConfig {
        let mut config = (*self.server_config).clone();
        config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];
        RustlsConfig::from_config(Arc::new(config))
    }
}

fn read_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>, TlsError> {
    let mut reader = open(path)?;
    let certs = rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| TlsError::Read { path: path.to_path_buf(), source })?;

    if certs.is_empty() {
        return Err(TlsError::NoCertificates(path.to_path_buf()));
    }
    Ok(certs)
}

fn read_key(path: &Path) -> Result<PrivateKeyDer<'static>, TlsError> {
    let mut reader = open(path)?;
    rustls_pemfile::private_key(&mut reader)
        .map_err(|source| TlsError::Read { path: path.to_path_buf(), source })?
        .ok_or_else(|| TlsError::NoPrivateKey(path.to_path_buf()))
}

fn open(path: &Path) -> Result<BufReader<File>, TlsError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| TlsError::Read { path: path.to_path_buf(), source })
}
