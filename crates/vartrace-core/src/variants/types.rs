//! Variant descriptors

use std::collections::BTreeSet;
use std::path::PathBuf;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::algebra::Feature;
use crate::tree::{CodeTree, NodeId};

/// Where a variant's inputs live on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantPassport {
    /// Name identifying the variant, unique within a run.
    pub name: String,
    /// Root directory of the variant's source files.
    pub sources_root: PathBuf,
    /// Feature configuration file, one feature name per line. A missing
    /// file means an empty configuration.
    pub configuration: PathBuf,
}

impl VariantPassport {
    pub fn new(
        name: impl Into<String>,
        sources_root: impl Into<PathBuf>,
        configuration: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            sources_root: sources_root.into(),
            configuration: configuration.into(),
        }
    }
}

/// A loaded product variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variant {
    pub name: String,
    /// Features enabled in this variant's configuration.
    pub features: BTreeSet<Feature>,
    /// The variant's code tree; dropped once folded into the merged tree.
    pub tree: Option<CodeTree>,
    /// Merged-tree nodes this variant contributed, filled by the merge.
    #[serde(default)]
    pub merged_nodes: FxHashSet<NodeId>,
}

impl Variant {
    pub fn new(name: impl Into<String>, features: BTreeSet<Feature>, tree: CodeTree) -> Self {
        Self {
            name: name.into(),
            features,
            tree: Some(tree),
            merged_nodes: FxHashSet::default(),
        }
    }
}
