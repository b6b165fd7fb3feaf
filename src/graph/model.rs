//! Graph types: nodes keyed by name for lookup, stored by id for iteration.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

/// Stable node identity, assigned in first-seen order starting at 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

impl NodeId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A module in the call graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    /// Outgoing edges in the order they were seen.
    pub calls: Vec<NodeId>,
}

/// The complete node set.
///
/// Nodes live in a `Vec` indexed by [`NodeId`], so iteration order is id
/// order. The name index is only used to resolve endpoints while building.
/// Edges can only be added between nodes of this graph, which rules out
/// dangling ids in any `calls` list.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    index: HashMap<String, NodeId>,
}

impl Graph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the id for `name`, creating the node on first sight.
    pub fn ensure_node(&mut self, name: &str) -> NodeId {
        if let Some(&id) = self.index.get(name) {
            return id;
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node { id, name: name.to_owned(), calls: Vec::new() });
        self.index.insert(name.to_owned(), id);
        id
    }

    /// Record `from -> to`, creating `from` then `to` if they are new.
    ///
    /// With `dedupe` set, an edge already present is not appended again.
    /// Returns the `(from, to)` ids.
    pub fn add_edge(&mut self, from: &str, to: &str, dedupe: bool) -> (NodeId, NodeId) {
        let source = self.ensure_node(from);
        let target = self.ensure_node(to);
        let calls = &mut self.nodes[source.0].calls;
        if !(dedupe && calls.contains(&target)) {
            calls.push(target);
        }
        (source, target)
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    #[must_use]
    pub fn id_of(&self, name: &str) -> Option<NodeId> {
        self.index.get(name).copied()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Node> {
        self.id_of(name).and_then(|id| self.node(id))
    }

    /// All nodes in id order.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(|n| n.calls.len()).sum()
    }

    /// Every `(source, target)` pair, by source id then `calls` order.
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.nodes
            .iter()
            .flat_map(|n| n.calls.iter().map(move |&target| (n.id, target)))
    }
}

impl Serialize for Graph {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.nodes.serialize(serializer)
    }
}
