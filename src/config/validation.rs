//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that no two listeners claim the same port
//! - Validate value ranges (timeouts > 0, limits > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::ServerConfig;
use crate::net::transport::Transport;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{first} and {second} listeners both use port {port}")]
    PortConflict {
        first: Transport,
        second: Transport,
        port: u16,
    },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("invalid metrics address {0:?}")]
    MetricsAddress(String),
}

/// Validate a configuration, collecting every error found.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    // Port 0 means "ephemeral", so several listeners may legitimately ask for it.
    for (i, first) in Transport::ALL.iter().enumerate() {
        let port = first.port(&config.ports);
        if port == 0 {
            continue;
        }
        for second in &Transport::ALL[i + 1..] {
            if second.port(&config.ports) == port {
                errors.push(ValidationError::PortConflict {
                    first: *first,
                    second: *second,
                    port,
                });
            }
        }
    }

    let non_zero: [(&'static str, u64); 6] = [
        ("timeouts.request_secs", config.timeouts.request_secs),
        ("timeouts.read_secs", config.timeouts.read_secs),
        ("timeouts.handshake_secs", config.timeouts.handshake_secs),
        ("timeouts.shutdown_grace_secs", config.timeouts.shutdown_grace_secs),
        ("limits.max_body_size", config.limits.max_body_size as u64),
        ("limits.max_connections", config.limits.max_connections as u64),
    ];
    for (field, value) in non_zero {
        if value == 0 {
            errors.push(ValidationError::Zero { field });
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
