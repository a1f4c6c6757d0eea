//! QR rendering service behind an ordered request gatekeeper.

// Core subsystems
pub mod config;
pub mod error;
pub mod http;
pub mod render;
pub mod security;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::GatewayConfig;
pub use error::{ApiError, ErrorKind};
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
