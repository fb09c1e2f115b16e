//! Association partition cells

use std::collections::BTreeSet;

use rustc_hash::FxHashSet;

use crate::algebra::{update_modules, Feature, Module, ModuleSet};
use crate::formula::Formula;
use crate::tree::NodeId;

/// A partition cell of merged-tree nodes sharing identical presence
/// behavior across the variants processed so far.
///
/// The module sets bound the true condition from below and above: `min`
/// holds modules necessarily true whenever the code is present
/// (shrinking), `all` holds modules true in at least one contributing
/// variant (growing), `not` holds modules known to make the code absent
/// (growing), and `max` is maintained as `all \ not`.
#[derive(Debug, Clone)]
pub struct Association {
    /// Merged nodes currently covered by this cell.
    pub nodes: FxHashSet<NodeId>,
    pub min: ModuleSet,
    pub all: ModuleSet,
    pub max: ModuleSet,
    pub not: ModuleSet,
    /// True while this cell's code has been present in every variant
    /// seen so far under an unchanged feature universe.
    pub basic: bool,
    /// The resolved formula, absent until resolution.
    pub mapping: Option<Formula>,
}

impl Association {
    /// A fresh association for one variant's modules and nodes.
    pub fn new(modules: ModuleSet, nodes: FxHashSet<NodeId>) -> Self {
        Self {
            nodes,
            min: modules.clone(),
            all: modules.clone(),
            max: modules,
            not: ModuleSet::default(),
            basic: true,
            mapping: None,
        }
    }

    /// Widens all four module sets with the features newly introduced by
    /// the current variant. Older associations' code could not have
    /// depended on those features, so every subset of them is recorded
    /// as necessarily absent. A nonempty widening also retires the
    /// `basic` flag: the feature universe changed under this cell.
    pub fn widened(&self, neg_features: &BTreeSet<Feature>) -> Self {
        Self {
            nodes: self.nodes.clone(),
            min: update_modules(&self.min, neg_features),
            all: update_modules(&self.all, neg_features),
            max: update_modules(&self.max, neg_features),
            not: update_modules(&self.not, neg_features),
            basic: self.basic && neg_features.is_empty(),
            mapping: self.mapping.clone(),
        }
    }

    /// Recomputes `max` as `all \ not`.
    pub fn recompute_max(&mut self) {
        self.max = self.all.difference(&self.not).cloned().collect();
    }

    /// The `min` modules with the fewest literals.
    pub fn smallest_min_modules(&self) -> Vec<&Module> {
        smallest_modules(&self.min)
    }

    /// The `max` modules with the fewest literals.
    pub fn smallest_max_modules(&self) -> Vec<&Module> {
        smallest_modules(&self.max)
    }
}

fn smallest_modules(modules: &ModuleSet) -> Vec<&Module> {
    let mut result: Vec<&Module> = Vec::new();
    let mut size = usize::MAX;
    for module in modules {
        if module.len() < size {
            result.clear();
            result.push(module);
            size = module.len();
        } else if module.len() == size {
            result.push(module);
        }
    }
    result
}
