//! Configuration loading from disk and environment.

use std::path::Path;
use std::fs;
use crate::config::schema::ServerConfig;
use crate::config::validation::{validate_config, ValidationError};

pub const ENV_HTTP_PORT: &str = "HTTP_PORT";
pub const ENV_HTTPS_PORT: &str = "HTTPS_PORT";
pub const ENV_TCP_BODY_PORT: &str = "TCP_BODY_PORT";
pub const ENV_TLS_BODY_PORT: &str = "TLS_BODY_PORT";
pub const ENV_BIND_HOST: &str = "BIND_HOST";
pub const ENV_TLS_CERT_PATH: &str = "TLS_CERT_PATH";
pub const ENV_TLS_KEY_PATH: &str = "TLS_KEY_PATH";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Env { var: &'static str, value: String },
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Env { var, value } => {
                write!(f, "Invalid value {:?} for {}: expected a port number", value, var)
            }
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load configuration: defaults, then the optional TOML file, then the
/// process environment. The result is validated before it is returned.
pub fn load_config(path: Option<&Path>) -> Result<ServerConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
            toml::from_str(&content).map_err(ConfigError::Parse)?
        }
        None => ServerConfig::default(),
    };

    apply_env(&mut config, |var| std::env::var(var).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay environment variables on a configuration.
///
/// `lookup` resolves a variable name; unset and empty variables leave the
/// current value untouched.
pub fn apply_env<F>(config: &mut ServerConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

    let ports = [
        (ENV_HTTP_PORT, &mut config.ports.http),
        (ENV_HTTPS_PORT, &mut config.ports.https),
        (ENV_TCP_BODY_PORT, &mut config.ports.tcp),
        (ENV_TLS_BODY_PORT, &mut config.ports.tls),
    ];
    for (var, slot) in ports {
        if let Some(value) = get(var) {
            *slot = value
                .trim()
                .parse()
                .map_err(|_| ConfigError::Env { var, value })?;
        }
    }

    if let Some(host) = get(ENV_BIND_HOST) {
        config.bind_host = host;
    }
    if let Some(path) = get(ENV_TLS_CERT_PATH) {
        config.tls.cert_path = path;
    }
    if let Some(path) = get(ENV_TLS_KEY_PATH) {
        config.tls.key_path = path;
    }

    Ok(())
}
