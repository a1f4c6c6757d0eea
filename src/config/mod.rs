//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, environment overrides)
//!     → validation.rs (semantic checks)
//!     → loader.rs (generate missing secrets)
//!     → GatewayConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup and never reloaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{fill_missing_secrets, load_config, secret_fingerprint, ConfigError};
pub use schema::GatewayConfig;
pub use schema::{
    AuthConfig, CorsConfig, ListenerConfig, ObservabilityConfig, PlanConfig, RateLimitConfig,
    RenderConfig, SigningConfig,
};
