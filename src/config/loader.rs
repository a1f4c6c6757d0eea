//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use rand::RngCore;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variables read once at startup.
pub const ENV_API_TOKEN: &str = "QR_API_TOKEN";
pub const ENV_SIGNING_SECRET: &str = "QR_SIGNING_SECRET";
pub const ENV_BASE_DOMAIN: &str = "QR_BASE_DOMAIN";
pub const ENV_RATE_LIMIT_WINDOW: &str = "QR_RATE_LIMIT_WINDOW";
pub const ENV_RATE_LIMIT_MAX: &str = "QR_RATE_LIMIT_MAX";
pub const ENV_ALLOWED_ORIGINS: &str = "QR_ALLOWED_ORIGINS";
pub const ENV_OUTPUT_DIR: &str = "QR_OUTPUT_DIR";
pub const ENV_BIND_ADDRESS: &str = "QR_BIND_ADDRESS";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("{var}: expected an unsigned integer, got '{value}'")]
    Env { var: &'static str, value: String },

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from an optional TOML file, apply environment
/// overrides, and validate the result.
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => GatewayConfig::default(),
    };

    apply_env_overrides(&mut config, |var| std::env::var(var).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay environment values onto `config`.
///
/// `lookup` abstracts the environment so tests can supply their own values.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(token) = lookup(ENV_API_TOKEN) {
        config.auth.api_token = Some(token);
    }
    if let Some(secret) = lookup(ENV_SIGNING_SECRET) {
        config.signing.secret = Some(secret);
    }
    if let Some(domain) = lookup(ENV_BASE_DOMAIN) {
        config.render.base_domain = domain.trim_end_matches('/').to_string();
    }
    if let Some(dir) = lookup(ENV_OUTPUT_DIR) {
        config.render.output_dir = dir;
    }
    if let Some(addr) = lookup(ENV_BIND_ADDRESS) {
        config.listener.bind_address = addr;
    }
    if let Some(value) = lookup(ENV_RATE_LIMIT_WINDOW) {
        config.rate_limit.window_secs = parse_unsigned(ENV_RATE_LIMIT_WINDOW, &value)?;
    }
    if let Some(value) = lookup(ENV_RATE_LIMIT_MAX) {
        config.rate_limit.max_requests = parse_unsigned(ENV_RATE_LIMIT_MAX, &value)?;
    }
    if let Some(origins) = lookup(ENV_ALLOWED_ORIGINS) {
        config.cors.allowed_origins = origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect();
    }
    Ok(())
}

fn parse_unsigned<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Env {
        var,
        value: value.to_string(),
    })
}

/// Generate any secret the configuration does not provide.
///
/// Returns the names of the generated secrets so startup can report them.
pub fn fill_missing_secrets(config: &mut GatewayConfig) -> Vec<&'static str> {
    let mut generated = Vec::new();
    if config.auth.api_token.is_none() {
        config.auth.api_token = Some(random_secret());
        generated.push("auth.api_token");
    }
    if config.signing.secret.is_none() {
        config.signing.secret = Some(random_secret());
        generated.push("signing.secret");
    }
    generated
}

/// Short, non-reversible tag for logging which secret is in use.
pub fn secret_fingerprint(secret: &str) -> String {
    let digest = Sha256::digest(secret.as_bytes());
    hex::encode(&digest[..4])
}

fn random_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
