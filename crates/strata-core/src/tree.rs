//! Persisted directory listings.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::node::Node;

/// An ordered collection of nodes with unique names.
///
/// Nodes are kept sorted by name, so the canonical JSON encoding is
/// deterministic: two equivalent trees serialize to identical bytes and
/// therefore hash to the same identifier, regardless of insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node, keeping the collection sorted by name.
    ///
    /// Rejects a second node with the same name.
    pub fn insert(&mut self, node: Node) -> CoreResult<()> {
        match self
            .nodes
            .binary_search_by(|n| n.name.as_str().cmp(&node.name))
        {
            Ok(_) => Err(CoreError::DuplicateName { name: node.name }),
            Err(pos) => {
                self.nodes.insert(pos, node);
                Ok(())
            }
        }
    }

    /// Look up a node by leaf name.
    pub fn find(&self, name: &str) -> Option<&Node> {
        self.nodes
            .binary_search_by(|n| n.name.as_str().cmp(name))
            .ok()
            .map(|i| &self.nodes[i])
    }

    /// The nodes in canonical (name) order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if the tree has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Canonical JSON encoding; deterministic for equivalent trees.
    pub fn to_canonical_json(&self) -> CoreResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decode a tree from its JSON encoding.
    pub fn from_json(bytes: &[u8]) -> CoreResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
