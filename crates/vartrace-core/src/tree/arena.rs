//! Arena-backed code-element tree

use serde::{Deserialize, Serialize};

use crate::formula::Formula;

use super::types::{NodeKind, Position};

/// Index of a node within its [`CodeTree`] arena.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One code element: a file, folder, line, or language construct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementNode {
    /// Text or code snippet; absent for synthetic wrapper nodes.
    pub label: Option<String>,
    pub kind: NodeKind,
    /// Origin in the variant source; `Unspecified` for merged copies.
    pub position: Position,
    /// Disambiguates otherwise-identical siblings.
    pub sequence: u32,
    /// Feature formula annotation, set at most once per node.
    pub mapping: Option<Formula>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl ElementNode {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// A growable tree of code elements with a single root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeTree {
    nodes: Vec<ElementNode>,
    root: NodeId,
}

impl CodeTree {
    /// Creates a tree holding only a synthetic root node.
    pub fn new() -> Self {
        let root = ElementNode {
            label: None,
            kind: NodeKind::Root,
            position: Position::Root,
            sequence: 0,
            mapping: None,
            parent: None,
            children: Vec::new(),
        };
        Self {
            nodes: vec![root],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &ElementNode {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut ElementNode {
        &mut self.nodes[id.index()]
    }

    /// Total number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Adds a child, assigning a sequence number from the count of
    /// existing siblings with the same label and kind, so duplicate
    /// identical siblings stay distinguishable by content.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        label: Option<String>,
        kind: NodeKind,
        position: Position,
        mapping: Option<Formula>,
    ) -> NodeId {
        let sequence = self.nodes[parent.index()]
            .children
            .iter()
            .filter(|&&c| {
                let sibling = &self.nodes[c.index()];
                sibling.label == label && sibling.kind == kind
            })
            .count() as u32;
        self.push_child(parent, label, kind, position, mapping, sequence)
    }

    /// Adds a child with a caller-supplied sequence number. Used when
    /// copying nodes between trees, where the sequence must be preserved
    /// for similarity matching.
    pub fn graft_child(
        &mut self,
        parent: NodeId,
        label: Option<String>,
        kind: NodeKind,
        position: Position,
        mapping: Option<Formula>,
        sequence: u32,
    ) -> NodeId {
        self.push_child(parent, label, kind, position, mapping, sequence)
    }

    fn push_child(
        &mut self,
        parent: NodeId,
        label: Option<String>,
        kind: NodeKind,
        position: Position,
        mapping: Option<Formula>,
        sequence: u32,
    ) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(ElementNode {
            label,
            kind,
            position,
            sequence,
            mapping,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.index()].children.push(id);
        id
    }

    /// All nodes of the subtree rooted at `start`, depth first, `start`
    /// included.
    pub fn subtree(&self, start: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            result.push(id);
            stack.extend(self.nodes[id.index()].children.iter().rev());
        }
        result
    }

    /// Every node except the synthetic root.
    pub fn all_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        let root = self.root;
        (0..self.nodes.len() as u32)
            .map(NodeId)
            .filter(move |id| *id != root)
    }
}

impl Default for CodeTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Content-based similarity: equal labels, kinds, and sequence numbers,
/// with recursively similar (or both absent) parents. This is the
/// identity relation deciding whether two nodes from different variants
/// denote the same code.
pub fn similar(left_tree: &CodeTree, left: NodeId, right_tree: &CodeTree, right: NodeId) -> bool {
    let mut left = Some(left);
    let mut right = Some(right);
    loop {
        match (left, right) {
            (None, None) => return true,
            (Some(l), Some(r)) => {
                let ln = left_tree.node(l);
                let rn = right_tree.node(r);
                if ln.label != rn.label || ln.kind != rn.kind || ln.sequence != rn.sequence {
                    return false;
                }
                left = ln.parent();
                right = rn.parent();
            }
            _ => return false,
        }
    }
}
