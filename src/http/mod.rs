//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, state)
//!     → request.rs (request ID, client identity, header access)
//!     → handlers.rs (gatekeeper → render pipeline → JSON)
//!     → Send to client
//! ```

pub mod handlers;
pub mod request;
pub mod server;

pub use request::{ClientIdentity, UuidRequestId, X_REQUEST_ID};
pub use server::{AppState, GatewayServer};
