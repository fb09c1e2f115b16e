//! Association refinement
//!
//! The incremental partition refinement that tracks, per merged code
//! element, which feature combinations cause its presence. Each variant
//! step splits the running associations into intersection and remainder
//! cells and re-derives their bounding module sets.

mod refine;
mod types;

pub use refine::RefinementEngine;
pub use types::Association;
