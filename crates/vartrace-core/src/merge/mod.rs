//! Tree merge engine
//!
//! Folds variant trees into the single merged tree via structural
//! similarity matching and keeps the position map used to trace merged
//! nodes back to their origins.

mod engine;

pub use engine::MergedTree;
