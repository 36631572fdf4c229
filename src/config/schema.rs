//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the mediator server.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host or IP every listener binds to.
    pub bind_host: String,

    /// One port per transport.
    pub ports: PortsConfig,

    /// Certificate and key shared by both encrypted listeners.
    pub tls: TlsConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Body and connection limits.
    pub limits: LimitsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            ports: PortsConfig::default(),
            tls: TlsConfig::default(),
            timeouts: TimeoutConfig::default(),
            limits: LimitsConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Listener ports. A value of `0` lets the OS pick an ephemeral port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PortsConfig {
    /// Plain HTTP.
    pub http: u16,
    /// HTTP over TLS.
    pub https: u16,
    /// Raw TCP body listener.
    pub tcp: u16,
    /// Raw TCP body listener wrapped in TLS.
    pub tls: u16,
}

impl Default for PortsConfig {
    fn default() -> Self {
        Self {
            http: 8080,
            https: 8443,
            tcp: 9000,
            tls: 9001,
        }
    }
}

/// TLS material location.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TlsConfig {
    /// Path to certificate chain (PEM).
    pub cert_path: String,

    /// Path to private key (PEM).
    pub key_path: String,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            cert_path: "tls/cert.pem".to_string(),
            key_path: "tls/key.pem".to_string(),
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total time allowed for one HTTP request/response in seconds.
    pub request_secs: u64,

    /// Maximum wait for a single read on a raw stream in seconds.
    pub read_secs: u64,

    /// TLS handshake deadline on the raw TLS listener in seconds.
    pub handshake_secs: u64,

    /// How long stream listeners wait for in-flight connections on shutdown.
    pub shutdown_grace_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            read_secs: 30,
            handshake_secs: 10,
            shutdown_grace_secs: 10,
        }
    }
}

/// Request and connection limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum body size in bytes, for HTTP and raw streams alike.
    pub max_body_size: usize,

    /// Maximum concurrent connections per raw stream listener (backpressure).
    pub max_connections: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_size: 16 * 1024 * 1024, // 16MB
            max_connections: 10_000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
