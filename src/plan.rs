//! Plan pipeline: source text -> graph -> grouping -> layout.
//!
//! A [`Plan`] is computed in full before anything talks to a canvas and is
//! never mutated afterwards; the publish stage works on copies.

use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::classify::{ClassificationError, GroupRule, Grouping, classify};
use crate::connect::IntegrityError;
use crate::error::ErrorCode;
use crate::graph::{Graph, ParseError, ParseOptions, parse};
use crate::layout::{Layout, layout};
use crate::source::{GraphSource, SourceError};

#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Classify(#[from] ClassificationError),
    #[error(transparent)]
    Integrity(#[from] IntegrityError),
}

impl ErrorCode for PlanError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Source(e) => e.error_code(),
            Self::Parse(e) => e.error_code(),
            Self::Classify(e) => e.error_code(),
            Self::Integrity(e) => e.error_code(),
        }
    }
}

/// Everything the canvas stage needs, computed up front.
#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    pub graph: Graph,
    pub grouping: Grouping,
    pub layout: Layout,
    /// Malformed lines dropped under the skip policy.
    pub skipped: Vec<ParseError>,
}

/// Parse, classify and lay out `text`.
///
/// # Errors
///
/// Returns `Parse` under the abort policy, `Classify` when a node matches no
/// rule, and `Integrity` if the layout cannot resolve a grouped node.
pub fn build_plan(text: &str, rules: &[GroupRule], options: &ParseOptions) -> Result<Plan, PlanError> {
    let parsed = parse(text, options)?;
    let grouping = classify(&parsed.graph, rules)?;
    let layout = layout(&parsed.graph, rules, &grouping)?;

    info!(
        nodes = parsed.graph.len(),
        edges = parsed.graph.edge_count(),
        frames = layout.frames.len(),
        skipped = parsed.skipped.len(),
        "plan built"
    );

    Ok(Plan { graph: parsed.graph, grouping, layout, skipped: parsed.skipped })
}

/// Read the graph description at `path` from `source`, then [`build_plan`].
///
/// # Errors
///
/// Returns `Source` if the description cannot be read, otherwise as
/// [`build_plan`].
pub fn plan_from_source(
    source: &dyn GraphSource,
    path: &Path,
    rules: &[GroupRule],
    options: &ParseOptions,
) -> Result<Plan, PlanError> {
    let text = source.read(path)?;
    build_plan(&text, rules, options)
}

#[cfg(test)]
#[path = "plan_test.rs"]
mod tests;
