//! Two-stage publish of a [`Plan`] onto a canvas.
//!
//! DESIGN
//! ======
//! Stage 1 creates every frame concurrently; each frame's notes are created
//! concurrently as soon as that frame's id is known. The result is a copy of
//! the plan layout with every remote id filled in. Stage 2 resolves
//! connectors from that placed layout and creates them concurrently. No
//! connector request is issued until every note exists, so every endpoint id
//! is known. The plan itself is never mutated.
//!
//! A failed call aborts the publish; items already created stay on the board.

use futures::future::try_join_all;
use serde::Serialize;
use tracing::{debug, info};

use crate::canvas::{CanvasClient, CanvasError, NewConnector, NewFrame, NewNote};
use crate::connect::{Connector, IntegrityError, resolve_connectors};
use crate::error::ErrorCode;
use crate::layout::{Frame, Layout, PositionedNote};
use crate::palette::Palette;
use crate::plan::Plan;

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error(transparent)]
    Canvas(#[from] CanvasError),
    #[error(transparent)]
    Integrity(#[from] IntegrityError),
}

impl ErrorCode for PublishError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Canvas(e) => e.error_code(),
            Self::Integrity(e) => e.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Canvas(e) => e.retryable(),
            Self::Integrity(e) => e.retryable(),
        }
    }
}

/// What a publish created.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublishReport {
    pub board_id: String,
    /// The plan layout with remote ids filled in.
    pub layout: Layout,
    pub connector_ids: Vec<String>,
}

impl PublishReport {
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.layout.frames.len()
    }

    #[must_use]
    pub fn note_count(&self) -> usize {
        self.layout.note_count()
    }

    #[must_use]
    pub fn connector_count(&self) -> usize {
        self.connector_ids.len()
    }
}

/// Create the plan's frames, notes and connectors on `board_id`.
///
/// # Errors
///
/// Returns `Canvas` for the first failed canvas call and `Integrity` if the
/// placed layout cannot resolve an edge endpoint.
pub async fn publish(
    client: &dyn CanvasClient,
    board_id: &str,
    plan: &Plan,
    palette: &Palette,
) -> Result<PublishReport, PublishError> {
    let layout = place_layout(client, board_id, &plan.layout, palette).await?;
    info!(board_id, frames = layout.frames.len(), notes = layout.note_count(), "frames and notes created");

    let connectors = resolve_connectors(&plan.graph, &layout.frames)?;
    let connector_ids = try_join_all(
        connectors
            .iter()
            .map(|connector| create_connector(client, board_id, connector, palette)),
    )
    .await?;
    info!(board_id, connectors = connector_ids.len(), "connectors created");

    Ok(PublishReport { board_id: board_id.to_string(), layout, connector_ids })
}

// =============================================================================
// STAGE 1: FRAMES AND NOTES
// =============================================================================

async fn place_layout(
    client: &dyn CanvasClient,
    board_id: &str,
    layout: &Layout,
    palette: &Palette,
) -> Result<Layout, CanvasError> {
    let frames = try_join_all(
        layout
            .frames
            .iter()
            .map(|frame| place_frame(client, board_id, frame, palette)),
    )
    .await?;
    Ok(Layout { frames })
}

async fn place_frame(
    client: &dyn CanvasClient,
    board_id: &str,
    frame: &Frame,
    palette: &Palette,
) -> Result<Frame, CanvasError> {
    let request = NewFrame {
        title: frame.title.clone(),
        fill_hex: palette.hex(&frame.color),
        x: frame.x,
        y: frame.y,
        width: frame.width,
        height: frame.height,
    };
    let frame_id = client.create_frame(board_id, &request).await?;
    debug!(board_id, %frame_id, title = %frame.title, notes = frame.notes.len(), "frame created");

    let notes = try_join_all(
        frame
            .notes
            .iter()
            .map(|note| place_note(client, board_id, &frame_id, &frame.color, note)),
    )
    .await?;

    Ok(Frame {
        group_index: frame.group_index,
        title: frame.title.clone(),
        color: frame.color.clone(),
        x: frame.x,
        y: frame.y,
        width: frame.width,
        height: frame.height,
        notes,
        remote_id: Some(frame_id),
    })
}

async fn place_note(
    client: &dyn CanvasClient,
    board_id: &str,
    frame_id: &str,
    color: &str,
    note: &PositionedNote,
) -> Result<PositionedNote, CanvasError> {
    let request = NewNote {
        parent_id: frame_id.to_string(),
        text: note.text.clone(),
        color: color.to_string(),
        x: note.x,
        y: note.y,
        width: note.width,
    };
    let note_id = client.create_note(board_id, &request).await?;
    Ok(PositionedNote { remote_id: Some(note_id), ..note.clone() })
}

// =============================================================================
// STAGE 2: CONNECTORS
// =============================================================================

async fn create_connector(
    client: &dyn CanvasClient,
    board_id: &str,
    connector: &Connector,
    palette: &Palette,
) -> Result<String, CanvasError> {
    let request = NewConnector {
        start_id: connector.source_remote_id.clone(),
        end_id: connector.target_remote_id.clone(),
        stroke_hex: palette.stroke_hex(&connector.color),
    };
    client.create_connector(board_id, &request).await
}

#[cfg(test)]
#[path = "render_test.rs"]
mod tests;
