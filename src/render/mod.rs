//! Rendering subsystem.
//!
//! # Data Flow
//! ```text
//! RenderRequest (JSON)
//!     → style.rs (validate, clamp → RenderJob)
//!     → matrix.rs (payload → module grid)
//!     → raster.rs (grid → RGBA symbol)
//!     → cube.rs + perspective.rs (cube3d only)
//!     → pipeline.rs (PNG via temp file + rename)
//! ```

pub mod color;
pub mod cube;
pub mod matrix;
pub mod perspective;
pub mod pipeline;
pub mod raster;
pub mod style;
pub mod variant;

pub use pipeline::{RenderError, RenderPipeline, RenderResult};
pub use style::{RenderJob, RenderRequest};
pub use variant::Variant;
