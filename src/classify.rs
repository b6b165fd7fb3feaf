//! First-match classification of graph nodes into ordered groups.
//!
//! DESIGN
//! ======
//! Rules are plain data (a regex and a color name) scanned linearly for every
//! node; the first rule whose pattern matches the node name wins. Rule order
//! is supplied by the caller and is the only tie-break. Groups keep graph
//! order, not match order, so layout output is stable across rule edits that
//! do not move a node.

use regex::Regex;
use serde::Serialize;

use crate::error::ErrorCode;
use crate::graph::{Graph, NodeId};

/// Title shown for a [`GroupRule::catch_all`] group.
pub const CATCH_ALL_PATTERN: &str = ".";

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassificationError {
    #[error("node {node:?} matches no group rule; add a catch-all rule")]
    Unmatched { node: String },
    #[error("no group rules configured")]
    NoRules,
}

impl ErrorCode for ClassificationError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Unmatched { .. } => "E_CLASSIFY_UNMATCHED",
            Self::NoRules => "E_CLASSIFY_NO_RULES",
        }
    }
}

/// Name-matching half of a [`GroupRule`].
#[derive(Debug, Clone)]
pub enum Pattern {
    /// Matches every name.
    Any,
    Regex(Regex),
}

impl Pattern {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Any => CATCH_ALL_PATTERN,
            Self::Regex(re) => re.as_str(),
        }
    }

    #[must_use]
    pub fn is_match(&self, name: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Regex(re) => re.is_match(name),
        }
    }
}

/// An ordered `(pattern, color)` pair.
#[derive(Debug, Clone)]
pub struct GroupRule {
    pub pattern: Pattern,
    pub color: String,
}

impl GroupRule {
    /// Compile `pattern` into a rule.
    ///
    /// # Errors
    ///
    /// Returns the regex compile error for an invalid pattern.
    pub fn new(pattern: &str, color: impl Into<String>) -> Result<Self, regex::Error> {
        Ok(Self { pattern: Pattern::Regex(Regex::new(pattern)?), color: color.into() })
    }

    /// A rule matching every name.
    #[must_use]
    pub fn catch_all(color: impl Into<String>) -> Self {
        Self { pattern: Pattern::Any, color: color.into() }
    }

    /// Frame title for this rule's group.
    #[must_use]
    pub fn title(&self) -> &str {
        self.pattern.as_str()
    }

    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        self.pattern.is_match(name)
    }
}

/// Nodes whose first matching rule was `rule_index`, in graph order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group {
    pub rule_index: usize,
    pub nodes: Vec<NodeId>,
}

impl Group {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }
}

/// One [`Group`] per rule, in rule order. Empty groups are kept so
/// `groups[i].rule_index == i` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Grouping {
    pub groups: Vec<Group>,
}

impl Grouping {
    /// Groups with at least one node, in rule order.
    pub fn non_empty(&self) -> impl Iterator<Item = &Group> {
        self.groups.iter().filter(|g| !g.is_empty())
    }

    /// Rule index a node was assigned to.
    #[must_use]
    pub fn rule_of(&self, node: NodeId) -> Option<usize> {
        self.groups
            .iter()
            .find(|g| g.nodes.contains(&node))
            .map(|g| g.rule_index)
    }
}

// =============================================================================
// CLASSIFY
// =============================================================================

/// Index of the first rule matching `name`.
#[must_use]
pub fn first_match(rules: &[GroupRule], name: &str) -> Option<usize> {
    rules.iter().position(|rule| rule.matches(name))
}

/// Partition every node of `graph` into the group of its first matching rule.
///
/// # Errors
///
/// Returns `NoRules` for an empty rule list and `Unmatched` for the first node
/// (in graph order) that no rule matches.
pub fn classify(graph: &Graph, rules: &[GroupRule]) -> Result<Grouping, ClassificationError> {
    if rules.is_empty() {
        return Err(ClassificationError::NoRules);
    }

    let mut groups: Vec<Group> = (0..rules.len())
        .map(|rule_index| Group { rule_index, nodes: Vec::new() })
        .collect();

    for node in graph.nodes() {
        let index =
            first_match(rules, &node.name).ok_or_else(|| ClassificationError::Unmatched { node: node.name.clone() })?;
        groups[index].nodes.push(node.id);
    }

    Ok(Grouping { groups })
}

#[cfg(test)]
#[path = "classify_test.rs"]
mod tests;
