//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (compact or JSON)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Every gate denial is logged with client identity, path and stage
//! - Request ID (x-request-id) is attached to the HTTP trace span
//! - Metrics are cheap and no-ops until the exporter is installed

pub mod logging;
pub mod metrics;
