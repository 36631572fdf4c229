//! Shared utilities for integration and load testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use mediator_server::config::ServerConfig;
use mediator_server::lifecycle::{self, RunningServer, Shutdown};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_rustls::rustls::crypto::aws_lc_rs;
use tokio_rustls::rustls::pki_types::{CertificateDer, ServerName};
use tokio_rustls::rustls::{ClientConfig, RootCertStore};
use tokio_rustls::TlsConnector;

pub const BASIC_AUTH: &str = "Basic cGVyZm9ybWFuY2U6cGVyZm9ybWFuY2U=";

/// Self-signed certificate for `localhost`, written to a fresh temp directory.
pub struct TestCert {
    pub dir: PathBuf,
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
    pub der: CertificateDer<'static>,
}

impl TestCert {
    pub fn generate() -> Self {
        let certified = rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
        let dir = std::env::temp_dir().join(format!("mediator-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();

        let cert_path = dir.join("cert.pem");
        let key_path = dir.join("key.pem");
        std::fs::write(&cert_path, certified.cert.pem()).unwrap();
        std::fs::write(&key_path, certified.key_pair.serialize_pem()).unwrap();

        Self {
            dir,
            cert_path,
            key_path,
            der: certified.cert.der().clone(),
        }
    }
}

impl Drop for TestCert {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.dir);
    }
}

/// Loopback config with every port ephemeral.
pub fn test_config(cert: &TestCert) -> ServerConfig {
    let mut config = ServerConfig::default();
    config.bind_host = "127.0.0.1".to_string();
    config.ports.http = 0;
    config.ports.https = 0;
    config.ports.tcp = 0;
    config.ports.tls = 0;
    config.tls.cert_path = cert.cert_path.to_string_lossy().into_owned();
    config.tls.key_path = cert.key_path.to_string_lossy().into_owned();
    config.timeouts.shutdown_grace_secs = 1;
    config
}

/// Start the server; it stops when the returned `Shutdown` is triggered or dropped.
pub async fn start_server(config: ServerConfig) -> (RunningServer, Shutdown) {
    let shutdown = Shutdown::new();
    let server = lifecycle::start(config, &shutdown).await.unwrap();
    (server, shutdown)
}

/// A port that was free a moment ago.
pub fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

pub fn https_client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .danger_accept_invalid_certs(true)
        .build()
        .unwrap()
}

/// Send `payload` over plain TCP, half-close, and return the full reply.
pub async fn tcp_exchange(addr: SocketAddr, payload: &[u8]) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(payload).await.unwrap();
    stream.shutdown().await.unwrap();

    let mut reply = String::new();
    stream.read_to_string(&mut reply).await.unwrap();
    reply
}

/// TLS connector trusting only `cert`.
pub fn tls_connector(cert: &TestCert) -> TlsConnector {
    let mut roots = RootCertStore::empty();
    roots.add(cert.der.clone()).unwrap();

    let config = ClientConfig::builder_with_provider(Arc::new(aws_lc_rs::default_provider()))
        .with_safe_default_protocol_versions()
        .unwrap()
        .with_root_certificates(roots)
        .with_no_client_auth();
    TlsConnector::from(Arc::new(config))
}

/// Send `payload` over TLS, close_notify, and return the full reply.
pub async fn tls_exchange(addr: SocketAddr, cert: &TestCert, payload: &[u8]) -> String {
    let stream = TcpStream::connect(addr).await.unwrap();
    let server_name = ServerName::try_from("localhost").unwrap();
    let mut tls = tls_connector(cert).connect(server_name, stream).await.unwrap();

    tls.write_all(payload).await.unwrap();
    tls.shutdown().await.unwrap();

    let mut reply = String::new();
    tls.read_to_string(&mut reply).await.unwrap();
    reply
}
