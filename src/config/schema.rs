//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root configuration for the QR gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, request limits).
    pub listener: ListenerConfig,

    /// Bearer credential.
    pub auth: AuthConfig,

    /// Request signing (HMAC) settings.
    pub signing: SigningConfig,

    /// Sliding-window rate limiting.
    pub rate_limit: RateLimitConfig,

    /// Plan requirements per rendering variant.
    pub plans: PlanConfig,

    /// Rendering output settings.
    pub render: RenderConfig,

    /// Allowed CORS origins.
    pub cors: CorsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:5001").
    pub bind_address: String,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout (total time for request/response) in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:5001".to_string(),
            max_body_bytes: 64 * 1024,
            request_timeout_secs: 30,
        }
    }
}

/// Bearer credential configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AuthConfig {
    /// Shared bearer token. Generated at startup when absent.
    pub api_token: Option<String>,
}

/// Request signing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SigningConfig {
    /// HMAC-SHA256 key. Generated at startup when absent.
    pub secret: Option<String>,

    /// Maximum tolerated distance between a signed timestamp and server time.
    pub freshness_secs: u64,

    /// Reject unsigned requests instead of letting them through.
    pub required: bool,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            secret: None,
            freshness_secs: 300,
            required: false,
        }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Trailing window length in seconds.
    pub window_secs: u64,

    /// Maximum requests per identity within the window.
    pub max_requests: u32,

    /// Upper bound on distinct identities held in memory.
    pub max_tracked_identities: usize,

    /// Interval between background sweeps of idle identities.
    pub sweep_interval_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_secs: 60,
            max_requests: 30,
            max_tracked_identities: 100_000,
            sweep_interval_secs: 60,
        }
    }
}

/// Plan gating configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PlanConfig {
    /// Variant identifier -> minimum plan name.
    pub requirements: BTreeMap<String, String>,
}

impl Default for PlanConfig {
    fn default() -> Self {
        let requirements = [
            ("standard", "free"),
            ("micro", "free"),
            ("compact", "pro"),
            ("custom", "pro"),
            ("holographic", "business"),
            ("cube3d", "business"),
        ]
        .into_iter()
        .map(|(variant, plan)| (variant.to_string(), plan.to_string()))
        .collect();

        Self { requirements }
    }
}

/// Rendering configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Base of the redirect URL encoded into each symbol (`<base>/q/<slug>`).
    pub base_domain: String,

    /// Directory where artifacts are written and served from.
    pub output_dir: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            base_domain: "http://localhost:8888".to_string(),
            output_dir: "generated".to_string(),
        }
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CorsConfig {
    /// Origins allowed to call the API. Empty disables CORS headers.
    pub allowed_origins: Vec<String>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log format ("compact" or "json").
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "compact".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
