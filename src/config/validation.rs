//! Configuration validation.
//!
//! Serde handles syntax; this module checks value ranges and references.
//! All problems are collected so an operator sees every mistake at once.

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;
use crate::security::plan::PlanTier;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("{0} must not be empty when set")]
    EmptySecret(&'static str),

    #[error("plans.requirements.{variant}: unknown plan '{plan}'")]
    UnknownPlan { variant: String, plan: String },

    #[error("render.base_domain: '{0}' is not an http(s) URL")]
    InvalidBaseDomain(String),

    #[error("render.output_dir must not be empty")]
    EmptyOutputDir,

    #[error("observability.log_format: expected 'compact' or 'json', got '{0}'")]
    InvalidLogFormat(String),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.listener.max_body_bytes == 0 {
        errors.push(ValidationError::Zero("listener.max_body_bytes"));
    }
    if config.listener.request_timeout_secs == 0 {
        errors.push(ValidationError::Zero("listener.request_timeout_secs"));
    }

    if matches!(&config.auth.api_token, Some(t) if t.is_empty()) {
        errors.push(ValidationError::EmptySecret("auth.api_token"));
    }
    if matches!(&config.signing.secret, Some(s) if s.is_empty()) {
        errors.push(ValidationError::EmptySecret("signing.secret"));
    }
    if config.signing.freshness_secs == 0 {
        errors.push(ValidationError::Zero("signing.freshness_secs"));
    }

    let rl = &config.rate_limit;
    if rl.window_secs == 0 {
        errors.push(ValidationError::Zero("rate_limit.window_secs"));
    }
    if rl.max_requests == 0 {
        errors.push(ValidationError::Zero("rate_limit.max_requests"));
    }
    if rl.max_tracked_identities == 0 {
        errors.push(ValidationError::Zero("rate_limit.max_tracked_identities"));
    }
    if rl.sweep_interval_secs == 0 {
        errors.push(ValidationError::Zero("rate_limit.sweep_interval_secs"));
    }

    for (variant, plan) in &config.plans.requirements {
        if PlanTier::from_name(plan).is_none() {
            errors.push(ValidationError::UnknownPlan {
                variant: variant.clone(),
                plan: plan.clone(),
            });
        }
    }

    match Url::parse(&config.render.base_domain) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {}
        _ => errors.push(ValidationError::InvalidBaseDomain(
            config.render.base_domain.clone(),
        )),
    }
    if config.render.output_dir.trim().is_empty() {
        errors.push(ValidationError::EmptyOutputDir);
    }

    let obs = &config.observability;
    if !matches!(obs.log_format.as_str(), "compact" | "json") {
        errors.push(ValidationError::InvalidLogFormat(obs.log_format.clone()));
    }
    if obs.metrics_enabled && obs.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: obs.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn collects_every_error() {
        let mut config = GatewayConfig::default();
        config.listener.bind_address = "nowhere".into();
        config.rate_limit.max_requests = 0;
        config.render.base_domain = "ftp://files.example".into();
        config
            .plans
            .requirements
            .insert("cube3d".into(), "platinum".into());

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::Zero("rate_limit.max_requests")));
        assert!(errors.contains(&ValidationError::UnknownPlan {
            variant: "cube3d".into(),
            plan: "platinum".into(),
        }));
    }

    #[test]
    fn empty_token_rejected() {
        let mut config = GatewayConfig::default();
        config.auth.api_token = Some(String::new());
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::EmptySecret("auth.api_token")]);
    }
}
