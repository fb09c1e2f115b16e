//! The per-variant refinement step

use std::collections::BTreeSet;
use std::mem;

use rustc_hash::FxHashSet;
use tracing::debug;

use crate::algebra::{features_to_modules, Feature, ModuleSet};
use crate::tree::NodeId;

use super::types::Association;

/// Drives the sequential, order-sensitive refinement over variants.
///
/// Holds the running feature universe and the current generation of
/// associations. Steps must be applied in variant order; each step's
/// output is the next step's input.
#[derive(Debug, Default)]
pub struct RefinementEngine {
    all_features: BTreeSet<Feature>,
    associations: Vec<Association>,
}

impl RefinementEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every feature seen in any variant processed so far.
    pub fn all_features(&self) -> &BTreeSet<Feature> {
        &self.all_features
    }

    /// The current generation of associations.
    pub fn associations(&self) -> &[Association] {
        &self.associations
    }

    /// Consumes the engine after the last variant, yielding the final
    /// association set.
    pub fn finish(self) -> Vec<Association> {
        self.associations
    }

    /// Refines the partition with one variant: `variant_nodes` are the
    /// merged-tree nodes corresponding to the variant's tree, `features`
    /// its configuration.
    pub fn step(&mut self, variant_nodes: FxHashSet<NodeId>, features: &BTreeSet<Feature>) {
        // Features that are new as of this step. They widen every older
        // association: code seen before this variant cannot depend on
        // them positively.
        let neg_features: BTreeSet<Feature> = features
            .difference(&self.all_features)
            .cloned()
            .collect();
        let negatives: BTreeSet<Feature> = self
            .all_features
            .difference(features)
            .cloned()
            .collect();
        let modules = features_to_modules(features, &negatives);
        self.all_features.extend(features.iter().cloned());

        let mut a_new = Association::new(modules, variant_nodes);
        let mut next = Vec::with_capacity(self.associations.len() * 2 + 1);
        for association in mem::take(&mut self.associations) {
            let mut updated = association.widened(&neg_features);

            // code present both in this variant and in the old cell
            let shared: FxHashSet<NodeId> = updated
                .nodes
                .intersection(&a_new.nodes)
                .copied()
                .collect();

            let mut a_int = Association {
                nodes: shared.clone(),
                min: updated.min.intersection(&a_new.min).cloned().collect(),
                all: updated.all.union(&a_new.all).cloned().collect(),
                max: ModuleSet::default(),
                not: updated.not.clone(),
                basic: updated.basic,
                mapping: None,
            };
            a_int.recompute_max();

            // code in the old cell but absent from this variant: every
            // module of the new variant is now known to exclude it
            updated.nodes.retain(|n| !shared.contains(n));
            updated.min.retain(|m| !a_int.min.contains(m));
            updated.not.extend(a_new.all.iter().cloned());
            updated.recompute_max();
            updated.basic = false;

            // code in this variant but not in the old cell, symmetrically
            a_new.nodes.retain(|n| !shared.contains(n));
            a_new.min.retain(|m| !a_int.min.contains(m));
            a_new.not.extend(updated.all.iter().cloned());
            a_new.recompute_max();
            a_new.basic = false;

            next.push(a_int);
            next.push(updated);
        }
        next.push(a_new);
        next.retain(|a| !a.nodes.is_empty());
        debug!(
            associations = next.len(),
            features = self.all_features.len(),
            "refined partition"
        );
        self.associations = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::{Literal, Module};

    fn features(names: &[&str]) -> BTreeSet<Feature> {
        names.iter().map(|n| Feature::new(*n)).collect()
    }

    fn nodes(ids: &[u32]) -> FxHashSet<NodeId> {
        // fabricate node ids through a throwaway tree
        use crate::tree::{CodeTree, NodeKind, Position};
        let mut tree = CodeTree::new();
        let mut all = Vec::new();
        let max = ids.iter().copied().max().unwrap_or(0);
        for i in 0..=max {
            all.push(tree.add_child(
                tree.root(),
                Some(format!("n{i}")),
                NodeKind::Line,
                Position::Unspecified,
                None,
            ));
        }
        ids.iter().map(|&i| all[i as usize]).collect()
    }

    fn module(positive: &[&str], negative: &[&str]) -> Module {
        let mut literals: BTreeSet<Literal> = positive
            .iter()
            .map(|n| Literal::positive(Feature::new(*n)))
            .collect();
        literals.extend(negative.iter().map(|n| Literal::negative(Feature::new(*n))));
        Module::new(literals)
    }

    fn covered_union(engine: &RefinementEngine) -> FxHashSet<NodeId> {
        engine
            .associations()
            .iter()
            .flat_map(|a| a.nodes.iter().copied())
            .collect()
    }

    #[test]
    fn associations_partition_the_processed_nodes() {
        let mut engine = RefinementEngine::new();
        let v1 = nodes(&[0, 1, 2]);
        let v2 = nodes(&[1, 2, 3]);
        let v3 = nodes(&[2, 4]);
        let mut expected_union = FxHashSet::default();
        for (variant_nodes, config) in [
            (v1, features(&["A"])),
            (v2, features(&["B"])),
            (v3, features(&["A", "C"])),
        ] {
            expected_union.extend(variant_nodes.iter().copied());
            engine.step(variant_nodes, &config);

            // pairwise disjoint
            let cells = engine.associations();
            for (i, left) in cells.iter().enumerate() {
                for right in &cells[i + 1..] {
                    assert!(left.nodes.is_disjoint(&right.nodes));
                }
            }
            // union covers everything processed so far
            assert_eq!(covered_union(&engine), expected_union);
        }
    }

    #[test]
    fn empty_cells_are_pruned() {
        let mut engine = RefinementEngine::new();
        engine.step(nodes(&[0, 1]), &features(&["A"]));
        // identical node set again: the old cell shrinks to nothing
        engine.step(nodes(&[0, 1]), &features(&["A"]));
        assert_eq!(engine.associations().len(), 1);
    }

    #[test]
    fn shared_code_with_disjoint_features_loses_basic() {
        let mut engine = RefinementEngine::new();
        engine.step(nodes(&[0]), &features(&["A"]));
        assert!(engine.associations()[0].basic);
        engine.step(nodes(&[0]), &features(&["B"]));
        let cells = engine.associations();
        assert_eq!(cells.len(), 1);
        let cell = &cells[0];
        assert!(!cell.basic);
        assert!(cell.min.is_empty());
        assert_eq!(
            cell.max,
            [
                module(&["A"], &[]),
                module(&["A"], &["B"]),
                module(&["B"], &[]),
                module(&["B"], &["A"]),
            ]
            .into_iter()
            .collect::<ModuleSet>()
        );
    }

    #[test]
    fn shared_code_under_an_unchanged_universe_stays_basic() {
        let mut engine = RefinementEngine::new();
        for _ in 0..3 {
            engine.step(nodes(&[0]), &features(&["A"]));
        }
        let cells = engine.associations();
        assert_eq!(cells.len(), 1);
        assert!(cells[0].basic);
        assert_eq!(cells[0].min, [module(&["A"], &[])].into_iter().collect());
    }

    // Pins the narrow "new negative features" rule: widening uses only
    // features that are new as of the current step, not everything the
    // old association has never seen.
    #[test]
    fn widening_uses_only_newly_introduced_features() {
        let mut engine = RefinementEngine::new();
        // v1 introduces A; its code never appears again
        engine.step(nodes(&[0]), &features(&["A"]));
        // v2 introduces B on disjoint code
        engine.step(nodes(&[1]), &features(&["B"]));
        // v3 re-uses A and B, introduces C, again on disjoint code
        engine.step(nodes(&[2]), &features(&["A", "B", "C"]));

        let cells = engine.associations();
        assert_eq!(cells.len(), 3);
        let v1_cell = cells
            .iter()
            .find(|a| a.nodes == nodes(&[0]))
            .expect("v1 cell survives");
        // widened by B at step 2 and by C at step 3, never by B twice:
        // min = {A} x subsets of {B} x subsets of {C}, minus the bare
        // {A} that moved into the (empty) intersection cell at step 3
        let expected: ModuleSet = [
            module(&["A"], &["B"]),
            module(&["A"], &["C"]),
            module(&["A"], &["B", "C"]),
        ]
        .into_iter()
        .collect();
        assert_eq!(v1_cell.min, expected);

        // the v3 cell was built against the full universe, so its
        // modules mention no negatives at all (A, B, C all positive in v3)
        let v3_cell = cells
            .iter()
            .find(|a| a.nodes == nodes(&[2]))
            .expect("v3 cell survives");
        assert!(v3_cell
            .all
            .iter()
            .all(|m| m.literals().iter().all(|l| l.positive)));
        assert_eq!(v3_cell.all.len(), 7);
    }
}
