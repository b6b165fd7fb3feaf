//! Connector resolution: maps graph edges onto placed notes.
//!
//! Runs after every note has a remote id. Each node must be placed exactly
//! once across all frames; anything else is a bug upstream (parse, classify
//! or the canvas stage), so every failure here is fatal and never retried.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::ErrorCode;
use crate::graph::{Graph, NodeId};
use crate::layout::Frame;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntegrityError {
    #[error("node {node} is placed in more than one frame")]
    DuplicatePlacement { node: NodeId },
    #[error("node {node} has no placement")]
    MissingPlacement { node: NodeId },
    #[error("node {node} was placed but has no remote id")]
    UnresolvedRemoteId { node: NodeId },
    #[error("grouping refers to unknown node {node}")]
    UnknownNode { node: NodeId },
    #[error("grouping refers to unknown rule index {index}")]
    UnknownRule { index: usize },
}

impl ErrorCode for IntegrityError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::DuplicatePlacement { .. } => "E_INTEGRITY_DUPLICATE_PLACEMENT",
            Self::MissingPlacement { .. } => "E_INTEGRITY_MISSING_PLACEMENT",
            Self::UnresolvedRemoteId { .. } => "E_INTEGRITY_UNRESOLVED_REMOTE_ID",
            Self::UnknownNode { .. } => "E_INTEGRITY_UNKNOWN_NODE",
            Self::UnknownRule { .. } => "E_INTEGRITY_UNKNOWN_RULE",
        }
    }
}

/// A directed line between two created notes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Connector {
    pub source_remote_id: String,
    pub target_remote_id: String,
    /// Color name of the source node's frame.
    pub color: String,
}

struct Placement<'a> {
    remote_id: Option<&'a str>,
    color: &'a str,
}

// =============================================================================
// RESOLVE
// =============================================================================

/// Build one connector per graph edge, in source-id then `calls` order.
///
/// # Errors
///
/// Returns `DuplicatePlacement` if a node appears in two frames,
/// `MissingPlacement` if a graph node appears in none, and
/// `UnresolvedRemoteId` if an edge endpoint was never created on the canvas.
pub fn resolve_connectors(graph: &Graph, frames: &[Frame]) -> Result<Vec<Connector>, IntegrityError> {
    let placements = index_placements(graph, frames)?;

    let mut connectors = Vec::with_capacity(graph.edge_count());
    for (source, target) in graph.edges() {
        let from = lookup(&placements, source)?;
        let to = lookup(&placements, target)?;
        connectors.push(Connector {
            source_remote_id: remote_id(from, source)?.to_owned(),
            target_remote_id: remote_id(to, target)?.to_owned(),
            color: from.color.to_owned(),
        });
    }

    Ok(connectors)
}

fn index_placements<'a>(
    graph: &Graph,
    frames: &'a [Frame],
) -> Result<HashMap<NodeId, Placement<'a>>, IntegrityError> {
    let mut placements = HashMap::with_capacity(graph.len());
    for frame in frames {
        for note in &frame.notes {
            let placement = Placement { remote_id: note.remote_id.as_deref(), color: &frame.color };
            if placements.insert(note.node, placement).is_some() {
                return Err(IntegrityError::DuplicatePlacement { node: note.node });
            }
        }
    }

    if let Some(node) = graph.nodes().iter().find(|n| !placements.contains_key(&n.id)) {
        return Err(IntegrityError::MissingPlacement { node: node.id });
    }

    Ok(placements)
}

fn lookup<'m, 'a>(
    placements: &'m HashMap<NodeId, Placement<'a>>,
    node: NodeId,
) -> Result<&'m Placement<'a>, IntegrityError> {
    placements
        .get(&node)
        .ok_or(IntegrityError::MissingPlacement { node })
}

fn remote_id<'a>(placement: &Placement<'a>, node: NodeId) -> Result<&'a str, IntegrityError> {
    placement
        .remote_id
        .ok_or(IntegrityError::UnresolvedRemoteId { node })
}

#[cfg(test)]
#[path = "connect_test.rs"]
mod tests;
