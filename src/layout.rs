//! Layout engine: packs classified groups into frames and notes on a fixed grid.
//!
//! DESIGN
//! ======
//! Frames stack top to bottom in columns of [`FRAMES_PER_COLUMN`]; a full
//! column starts a new one to the right. Inside a frame, notes fill rows of
//! [`NOTES_PER_ROW`] left to right. Frame height is derived from the row
//! count, so nothing can overlap and the result is a pure function of the
//! grouping. Note coordinates are relative to the owning frame and point at
//! the note center, which is why the first note sits at half a note in.

use serde::Serialize;

use crate::classify::{GroupRule, Grouping};
use crate::connect::IntegrityError;
use crate::graph::{Graph, NodeId};

// Geometry (canvas pixels).
pub const NOTE_WIDTH: f64 = 200.0;
pub const NOTE_HEIGHT: f64 = 230.0;
pub const NOTE_GAP_X: f64 = 30.0;
pub const NOTE_GAP_Y: f64 = 20.0;
pub const FRAME_WIDTH: f64 = 2000.0;
pub const FRAME_GAP_X: f64 = 200.0;
pub const FRAME_GAP_Y: f64 = 500.0;
pub const NOTES_PER_ROW: usize = 8;
pub const FRAMES_PER_COLUMN: usize = 3;

/// Height of one row of notes inside a frame, padded above and below.
pub const FRAME_ROW_HEIGHT: f64 = NOTE_HEIGHT + 2.0 * NOTE_GAP_Y;
pub const NOTE_ORIGIN_X: f64 = NOTE_WIDTH / 2.0;
pub const NOTE_ORIGIN_Y: f64 = NOTE_HEIGHT / 2.0 + NOTE_GAP_Y;

// =============================================================================
// TYPES
// =============================================================================

/// A node placed inside a frame, relative to the frame origin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionedNote {
    pub node: NodeId,
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    /// Set once the canvas has created the note.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_id: Option<String>,
}

/// One visual container per non-empty group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub group_index: usize,
    pub title: String,
    pub color: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub notes: Vec<PositionedNote>,
    /// Set once the canvas has created the frame.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Layout {
    pub frames: Vec<Frame>,
}

impl Layout {
    /// Number of note rows a frame with `note_count` notes needs.
    #[must_use]
    pub fn frame_rows(note_count: usize) -> usize {
        note_count.div_ceil(NOTES_PER_ROW)
    }

    #[must_use]
    pub fn frame_height(note_count: usize) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let rows = Self::frame_rows(note_count) as f64;
        rows * FRAME_ROW_HEIGHT
    }

    #[must_use]
    pub fn note_count(&self) -> usize {
        self.frames.iter().map(|f| f.notes.len()).sum()
    }

    /// All notes across all frames, in frame order.
    pub fn notes(&self) -> impl Iterator<Item = (&Frame, &PositionedNote)> {
        self.frames
            .iter()
            .flat_map(|frame| frame.notes.iter().map(move |note| (frame, note)))
    }

    /// True when every frame and note carries a remote id.
    #[must_use]
    pub fn is_placed(&self) -> bool {
        self.frames
            .iter()
            .all(|f| f.remote_id.is_some() && f.notes.iter().all(|n| n.remote_id.is_some()))
    }
}

// =============================================================================
// LAYOUT
// =============================================================================

/// Place every non-empty group as a frame and every node as a note.
///
/// # Errors
///
/// Returns `IntegrityError` if the grouping refers to a rule index or node id
/// that does not exist, which means it was built from a different graph or
/// rule list.
pub fn layout(graph: &Graph, rules: &[GroupRule], grouping: &Grouping) -> Result<Layout, IntegrityError> {
    let mut frames = Vec::new();
    let mut col_x = 0.0;
    let mut row_y = 0.0;

    for (placed, group) in grouping.non_empty().enumerate() {
        let rule = rules
            .get(group.rule_index)
            .ok_or(IntegrityError::UnknownRule { index: group.rule_index })?;
        let height = Layout::frame_height(group.len());

        frames.push(Frame {
            group_index: group.rule_index,
            title: rule.title().to_owned(),
            color: rule.color.clone(),
            x: col_x,
            y: row_y,
            width: FRAME_WIDTH,
            height,
            notes: place_notes(graph, &group.nodes)?,
            remote_id: None,
        });

        if (placed + 1).is_multiple_of(FRAMES_PER_COLUMN) {
            col_x += FRAME_WIDTH + FRAME_GAP_X;
            row_y = 0.0;
        } else {
            row_y += height + FRAME_GAP_Y;
        }
    }

    Ok(Layout { frames })
}

/// Row-major note placement starting at [`NOTE_ORIGIN_X`], [`NOTE_ORIGIN_Y`].
fn place_notes(graph: &Graph, ids: &[NodeId]) -> Result<Vec<PositionedNote>, IntegrityError> {
    let mut notes = Vec::with_capacity(ids.len());
    let mut x = NOTE_ORIGIN_X;
    let mut y = NOTE_ORIGIN_Y;

    for (k, &id) in ids.iter().enumerate() {
        let node = graph.node(id).ok_or(IntegrityError::UnknownNode { node: id })?;
        notes.push(PositionedNote { node: id, text: node.name.clone(), x, y, width: NOTE_WIDTH, remote_id: None });

        if (k + 1).is_multiple_of(NOTES_PER_ROW) {
            x = NOTE_ORIGIN_X;
            y += NOTE_HEIGHT + NOTE_GAP_Y;
        } else {
            x += NOTE_WIDTH + NOTE_GAP_X;
        }
    }

    Ok(notes)
}

#[cfg(test)]
#[path = "layout_test.rs"]
mod tests;
