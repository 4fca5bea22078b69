//! Arena-backed BOM trees.
//!
//! Entries are stored in a `Vec` and refer to each other by [`NodeIndex`]:
//! every entry knows its parent and its ordered children, nothing holds a
//! reference into the store graph. Trees serialize to the nested
//! `{..node, children: [{relationship, child}]}` snapshot shape.

use super::{Edge, Node, Substitute};
use crate::effectivity::Effectivity;
use serde::{Deserialize, Serialize};

/// Position of an entry inside a [`BomTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(usize);

impl NodeIndex {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// The edge an entry was reached through, with optional enrichment.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeEdge {
    pub edge: Edge,
    /// Present only when substitutes were requested during the build
    pub substitutes: Option<Vec<Substitute>>,
    /// Present only when effectivity records were requested during the build
    pub effectivities: Option<Vec<Effectivity>>,
}

impl TreeEdge {
    pub const fn plain(edge: Edge) -> Self {
        Self {
            edge,
            substitutes: None,
            effectivities: None,
        }
    }
}

/// One node of a BOM tree.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeEntry {
    pub node: Node,
    /// `None` only for the root
    pub via: Option<TreeEdge>,
    pub parent: Option<NodeIndex>,
    /// Root is level 0
    pub level: usize,
    children: Vec<NodeIndex>,
}

/// A depth-bounded product structure produced by one traversal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "TreeSnapshot", from = "TreeSnapshot")]
pub struct BomTree {
    entries: Vec<TreeEntry>,
}

/// A parent/child pair visited in pre-order by [`BomTree::edges`].
#[derive(Debug, Clone, Copy)]
pub struct EdgeVisit<'a> {
    pub parent: &'a Node,
    pub child: &'a Node,
    pub edge: &'a TreeEdge,
    /// Level of the child (1 for children of the root)
    pub level: usize,
    pub index: NodeIndex,
}

impl BomTree {
    /// Create a tree holding only `root`.
    pub fn new(root: Node) -> Self {
        Self {
            entries: vec![TreeEntry {
                node: root,
                via: None,
                parent: None,
                level: 0,
                children: Vec::new(),
            }],
        }
    }

    #[must_use]
    pub const fn root(&self) -> NodeIndex {
        NodeIndex(0)
    }

    pub fn root_node(&self) -> &Node {
        &self.entries[0].node
    }

    /// Get an entry. Indices are only valid for the tree that issued them.
    pub fn entry(&self, index: NodeIndex) -> &TreeEntry {
        &self.entries[index.0]
    }

    pub fn node(&self, index: NodeIndex) -> &Node {
        &self.entries[index.0].node
    }

    /// Append `node` as the last child of `parent`, reached through `via`.
    pub fn push_child(&mut self, parent: NodeIndex, via: TreeEdge, node: Node) -> NodeIndex {
        let index = NodeIndex(self.entries.len());
        let level = self.entries[parent.0].level + 1;
        self.entries.push(TreeEntry {
            node,
            via: Some(via),
            parent: Some(parent),
            level,
            children: Vec::new(),
        });
        self.entries[parent.0].children.push(index);
        index
    }

    /// Ordered children of `index` with the edge that admitted each.
    pub fn children(&self, index: NodeIndex) -> impl Iterator<Item = (&TreeEdge, NodeIndex)> + '_ {
        self.entries[index.0]
            .children
            .iter()
            .filter_map(move |&child| self.entries[child.0].via.as_ref().map(|via| (via, child)))
    }

    /// Number of nodes, root included
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.entries.len() - 1
    }

    /// Deepest level present (0 for a childless root)
    #[must_use]
    pub fn depth(&self) -> usize {
        self.entries.iter().map(|e| e.level).max().unwrap_or(0)
    }

    /// Node ids from the root down to `index`, inclusive.
    pub fn path(&self, index: NodeIndex) -> Vec<String> {
        let mut path = Vec::with_capacity(self.entries[index.0].level + 1);
        let mut cursor = Some(index);
        while let Some(current) = cursor {
            let entry = &self.entries[current.0];
            path.push(entry.node.id.clone());
            cursor = entry.parent;
        }
        path.reverse();
        path
    }

    /// All edges in depth-first pre-order, siblings in admission order.
    pub fn edges(&self) -> Vec<EdgeVisit<'_>> {
        let mut visits = Vec::with_capacity(self.edge_count());
        let mut stack: Vec<NodeIndex> = self.entries[0].children.iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            let entry = &self.entries[current.0];
            if let (Some(via), Some(parent)) = (entry.via.as_ref(), entry.parent) {
                visits.push(EdgeVisit {
                    parent: &self.entries[parent.0].node,
                    child: &entry.node,
                    edge: via,
                    level: entry.level,
                    index: current,
                });
            }
            stack.extend(entry.children.iter().rev().copied());
        }
        visits
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeIndex, &TreeEntry)> {
        self.entries.iter().enumerate().map(|(i, e)| (NodeIndex(i), e))
    }
}

// ============================================================================
// Nested snapshot form
// ============================================================================

/// Nested serialization shape of a [`BomTree`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeSnapshot {
    #[serde(flatten)]
    pub node: Node,
    #[serde(default)]
    pub children: Vec<ChildSnapshot>,
}

/// One `{relationship, child}` pair of a [`TreeSnapshot`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildSnapshot {
    pub relationship: Edge,
    pub child: TreeSnapshot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub substitutes: Option<Vec<Substitute>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effectivities: Option<Vec<Effectivity>>,
}

impl From<BomTree> for TreeSnapshot {
    fn from(tree: BomTree) -> Self {
        snapshot_of(&tree, tree.root())
    }
}

fn snapshot_of(tree: &BomTree, index: NodeIndex) -> TreeSnapshot {
    TreeSnapshot {
        node: tree.node(index).clone(),
        children: tree
            .children(index)
            .map(|(via, child)| ChildSnapshot {
                relationship: via.edge.clone(),
                child: snapshot_of(tree, child),
                substitutes: via.substitutes.clone(),
                effectivities: via.effectivities.clone(),
            })
            .collect(),
    }
}

impl From<TreeSnapshot> for BomTree {
    fn from(snapshot: TreeSnapshot) -> Self {
        let mut tree = Self::new(snapshot.node);
        attach(&mut tree, NodeIndex(0), snapshot.children);
        tree
    }
}

fn attach(tree: &mut BomTree, parent: NodeIndex, children: Vec<ChildSnapshot>) {
    for child in children {
        let via = TreeEdge {
            edge: child.relationship,
            substitutes: child.substitutes,
            effectivities: child.effectivities,
        };
        let index = tree.push_child(parent, via, child.child.node);
        attach(tree, index, child.child.children);
    }
}
