//! Line parser for the `digraph` edge-list subset.
//!
//! Each content line is either `"A" -> "B"` or a lone `"A"`. The header
//! (`digraph {`, `strict digraph G` plus a lone `{`, or a one-line `digraph {}`)
//! and closing `}` lines are dropped. Whitespace and quotes are
//! stripped before tokenizing, so `"a" -> "b"` and `a->b` are the same edge.

use serde::Serialize;
use tracing::{debug, warn};

use super::model::Graph;
use crate::error::ErrorCode;

const EDGE_SEPARATOR: &str = "->";

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParseError {
    #[error("malformed graph line {line_no}: {line:?}")]
    Malformed { line_no: usize, line: String },
}

impl ErrorCode for ParseError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Malformed { .. } => "E_PARSE_MALFORMED",
        }
    }
}

/// What to do with a line that is neither an edge nor a node declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MalformedLinePolicy {
    /// Log a warning, record the line in [`ParsedGraph::skipped`], continue.
    #[default]
    Skip,
    /// Stop at the first malformed line.
    Abort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParseOptions {
    pub on_malformed: MalformedLinePolicy,
    /// Collapse repeated `A -> B` lines into a single edge.
    pub dedupe_edges: bool,
}

/// A parsed graph plus every line that was skipped on the way.
#[derive(Debug, Clone, Default)]
pub struct ParsedGraph {
    pub graph: Graph,
    pub skipped: Vec<ParseError>,
}

enum Statement<'a> {
    Edge(&'a str, &'a str),
    Node(&'a str),
}

// =============================================================================
// PARSE
// =============================================================================

/// Parse edge-list text into a [`Graph`].
///
/// # Errors
///
/// Returns the first [`ParseError`] when `options.on_malformed` is
/// [`MalformedLinePolicy::Abort`]. With the default skip policy this never
/// fails; malformed lines are reported through [`ParsedGraph::skipped`].
pub fn parse(input: &str, options: &ParseOptions) -> Result<ParsedGraph, ParseError> {
    let lines: Vec<(usize, &str)> = input
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line))
        .filter(|(_, line)| !line.trim().is_empty())
        .collect();

    let mut body = lines.as_slice();
    if let Some(((_, first), rest)) = body.split_first() {
        if is_header(first) {
            body = rest;
            // `digraph G` with the opening brace on its own line.
            if !first.contains('{') {
                if let Some(((_, open), rest)) = body.split_first() {
                    if open.trim() == "{" {
                        body = rest;
                    }
                }
            }
        }
    }
    if let Some(((_, last), rest)) = body.split_last() {
        if last.trim() == "}" {
            body = rest;
        }
    }

    let mut parsed = ParsedGraph::default();
    for &(line_no, raw) in body {
        let cleaned = clean_line(raw);
        match parse_statement(&cleaned) {
            Some(Statement::Edge(from, to)) => {
                parsed.graph.add_edge(from, to, options.dedupe_edges);
            }
            Some(Statement::Node(name)) => {
                parsed.graph.ensure_node(name);
            }
            None => {
                let err = ParseError::Malformed { line_no, line: raw.to_owned() };
                match options.on_malformed {
                    MalformedLinePolicy::Abort => return Err(err),
                    MalformedLinePolicy::Skip => {
                        warn!(line_no, line = raw, "skipping malformed graph line");
                        parsed.skipped.push(err);
                    }
                }
            }
        }
    }

    debug!(
        nodes = parsed.graph.len(),
        edges = parsed.graph.edge_count(),
        skipped = parsed.skipped.len(),
        "parsed call graph"
    );
    Ok(parsed)
}

/// `digraph {`, `strict digraph G`, or a one-line `digraph {}`.
fn is_header(line: &str) -> bool {
    let line = line.trim();
    if line.ends_with('{') {
        return true;
    }
    let unqualified = line.strip_prefix("strict").map_or(line, str::trim_start);
    let Some(after) = unqualified.strip_prefix("digraph") else {
        return false;
    };
    let keyword_ends = after.chars().next().is_none_or(|c| c.is_whitespace() || c == '{');
    keyword_ends && !line.contains(EDGE_SEPARATOR)
}

/// Drop whitespace, quotes and a trailing statement terminator.
fn clean_line(line: &str) -> String {
    let mut cleaned: String = line
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '"')
        .collect();
    if cleaned.ends_with(';') {
        cleaned.pop();
    }
    cleaned
}

fn parse_statement(cleaned: &str) -> Option<Statement<'_>> {
    let mut parts = cleaned.split(EDGE_SEPARATOR);
    let first = parts.next()?;
    match (parts.next(), parts.next()) {
        (None, _) if !first.is_empty() => Some(Statement::Node(first)),
        (Some(second), None) if !first.is_empty() && !second.is_empty() => Some(Statement::Edge(first, second)),
        _ => None,
    }
}
