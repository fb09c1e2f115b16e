//! vartrace-core: Comparison-based feature trace extraction
//!
//! This crate recovers feature-to-code mappings from a set of product
//! variants:
//! - Algebra: Feature literals, modules, and the power-set operations
//! - Formula: Propositional formulas with structural equality and normal forms
//! - Tree: Arena-backed code-element trees and content similarity
//! - Merge: Folding variant trees into one merged tree with a position map
//! - Associations: Incremental partition refinement over variants
//! - Resolver: Heuristic formula resolution and simplification
//! - Variants: Passports, line-based tree building, bulk persistence
//! - Tracer: The end-to-end extraction pass

pub mod algebra;
pub mod associations;
pub mod error;
pub mod formula;
pub mod merge;
pub mod resolver;
pub mod tracer;
pub mod tree;
pub mod variants;

// Re-exports for convenience
pub use algebra::{Feature, Literal, Module, ModuleSet};
pub use associations::{Association, RefinementEngine};
pub use error::TraceError;
pub use formula::Formula;
pub use merge::MergedTree;
pub use resolver::{MappingResolver, SimplifyMode};
pub use tracer::{FeatureTracer, TraceResult};
pub use tree::{CodeTree, ElementNode, NodeId, NodeKind, Position, VariantPosition};
pub use variants::{
    LineTreeBuilder, TreeBuilder, TreeBuilderKind, Variant, VariantPassport,
};
