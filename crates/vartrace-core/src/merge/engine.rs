//! The merged tree and the per-variant fold

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::formula::Formula;
use crate::tree::{similar, CodeTree, NodeId, Position, VariantPosition};

/// The single tree accumulating all variants' code elements, plus the
/// map from merged node to the (variant, origin position) pairs that
/// contributed it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergedTree {
    tree: CodeTree,
    position_map: FxHashMap<NodeId, FxHashSet<VariantPosition>>,
    #[serde(skip)]
    inverse: Option<FxHashMap<VariantPosition, NodeId>>,
}

impl MergedTree {
    pub fn new() -> Self {
        Self {
            tree: CodeTree::new(),
            position_map: FxHashMap::default(),
            inverse: None,
        }
    }

    pub fn tree(&self) -> &CodeTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut CodeTree {
        &mut self.tree
    }

    /// Folds `variant`'s tree into this tree and returns the merged
    /// nodes corresponding to every node of the variant tree.
    ///
    /// For each variant node the entire subtree under the matched parent
    /// is searched for a similar node, depth first, first match wins.
    /// Unmatched nodes are grafted as fresh copies together with all
    /// their descendants.
    pub fn merge(&mut self, variant: &CodeTree, variant_name: &str) -> FxHashSet<NodeId> {
        let mut result = FxHashSet::default();
        self.inverse = None;
        self.merge_children(variant, variant.root(), self.tree.root(), variant_name, &mut result);
        result
    }

    fn merge_children(
        &mut self,
        variant: &CodeTree,
        variant_node: NodeId,
        merged_node: NodeId,
        variant_name: &str,
        result: &mut FxHashSet<NodeId>,
    ) {
        for &child in variant.node(variant_node).children() {
            match self.find_similar(variant, child, merged_node) {
                Some(found) => {
                    result.insert(found);
                    // accumulate, across variants, every condition under
                    // which this exact code appears
                    if let Some(child_mapping) = variant.node(child).mapping.clone() {
                        let node = self.tree.node_mut(found);
                        node.mapping = match node.mapping.take() {
                            Some(existing) if existing != child_mapping => {
                                Some(Formula::or([existing, child_mapping]))
                            }
                            _ => Some(child_mapping),
                        };
                    }
                    self.record(found, variant_name, variant.node(child).position.clone());
                    self.merge_children(variant, child, found, variant_name, result);
                }
                None => self.copy_subtree(variant, child, merged_node, variant_name, result),
            }
        }
    }

    fn copy_subtree(
        &mut self,
        variant: &CodeTree,
        variant_node: NodeId,
        merged_parent: NodeId,
        variant_name: &str,
        result: &mut FxHashSet<NodeId>,
    ) {
        let source = variant.node(variant_node);
        let label = source.label.clone();
        let kind = source.kind;
        let mapping = source.mapping.clone();
        let sequence = source.sequence;
        let position = source.position.clone();
        let copy = self.tree.graft_child(
            merged_parent,
            label,
            kind,
            Position::Unspecified,
            mapping,
            sequence,
        );
        result.insert(copy);
        self.record(copy, variant_name, position);
        for &child in variant.node(variant_node).children() {
            self.copy_subtree(variant, child, copy, variant_name, result);
        }
    }

    /// Depth-first search of the merged subtree rooted at `search_root`
    /// for a node similar to `variant_node`; first match wins.
    fn find_similar(
        &self,
        variant: &CodeTree,
        variant_node: NodeId,
        search_root: NodeId,
    ) -> Option<NodeId> {
        let mut stack = vec![search_root];
        while let Some(id) = stack.pop() {
            if similar(variant, variant_node, &self.tree, id) {
                return Some(id);
            }
            stack.extend(self.tree.node(id).children().iter().rev());
        }
        None
    }

    fn record(&mut self, node: NodeId, variant_name: &str, position: Position) {
        self.position_map
            .entry(node)
            .or_default()
            .insert(VariantPosition::new(variant_name, position));
    }

    /// The (variant, origin position) pairs that contributed `node`.
    pub fn positions(&self, node: NodeId) -> Option<&FxHashSet<VariantPosition>> {
        self.position_map.get(&node)
    }

    /// All merged nodes that were contributed by at least one variant.
    pub fn mapped_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.position_map.keys().copied()
    }

    /// Reverse lookup from an origin position to its merged node.
    /// Returns `None` for positions that were never recorded.
    pub fn node_at(&mut self, position: &VariantPosition) -> Option<NodeId> {
        let inverse = self.inverse.get_or_insert_with(|| {
            let mut map = FxHashMap::default();
            for (node, positions) in &self.position_map {
                for pos in positions {
                    map.insert(pos.clone(), *node);
                }
            }
            map
        });
        inverse.get(position).copied()
    }

    /// The resolved formula of the merged node at `position`, if both
    /// the node and its formula exist.
    pub fn mapping_at(&mut self, position: &VariantPosition) -> Option<&Formula> {
        let node = self.node_at(position)?;
        self.tree.node(node).mapping.as_ref()
    }
}

impl Default for MergedTree {
    fn default() -> Self {
        Self::new()
    }
}
