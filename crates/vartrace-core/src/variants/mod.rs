//! Variants: passports, source-tree builders, and bulk persistence.

mod builder;
mod loader;
mod types;

pub use builder::{LineTreeBuilder, TreeBuilder, TreeBuilderKind};
pub use loader::{
    init_variants, load_merged_tree, load_variants, read_configuration, save_merged_tree,
    save_variants,
};
pub use types::{Variant, VariantPassport};
