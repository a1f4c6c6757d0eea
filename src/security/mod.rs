//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming render request:
//!     → rate_limit.rs (sliding window per client identity)
//!     → auth.rs (bearer token, constant-time compare)
//!     → signature.rs (optional HMAC + freshness window)
//!     → plan.rs (variant tier requirement)
//!     → Pass to rendering
//! ```
//!
//! # Design Decisions
//! - gate.rs runs the stages in order as plain sequential calls
//! - Fail closed: unknown variants need the top paid tier, unknown plans are free
//! - No trust in client input

pub mod auth;
pub mod gate;
pub mod plan;
pub mod rate_limit;
pub mod signature;

pub use gate::{client_identity, Admission, Denial, GateRequest, Gatekeeper, Stage};
pub use plan::{PlanGate, PlanTier};
pub use rate_limit::{RateDecision, RateLimiter};
