//! Call-graph model and `digraph` edge-list parser.
//!
//! Parses the line-oriented subset of DOT emitted by call-graph exporters
//! (`"A" -> "B"` edges and bare `"A"` declarations) into a [`Graph`] whose
//! node ids follow first-seen order.

pub mod model;
pub mod parse;

pub use model::{Graph, Node, NodeId};
pub use parse::{MalformedLinePolicy, ParseError, ParseOptions, ParsedGraph, parse};

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
