//! In-process canvas that records every request.
//!
//! Used by tests and by `publish --dry-run`. Ids are fresh v4 UUIDs, so they
//! are unique across frames, notes and connectors alike.

use std::sync::{Mutex, PoisonError};

use tracing::debug;
use uuid::Uuid;

use super::{CanvasClient, CanvasError, NewConnector, NewFrame, NewNote};

/// One accepted request and the id minted for it.
#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    Frame { id: String, board_id: String, request: NewFrame },
    Note { id: String, board_id: String, request: NewNote },
    Connector { id: String, board_id: String, request: NewConnector },
}

impl Recorded {
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Frame { id, .. } | Self::Note { id, .. } | Self::Connector { id, .. } => id,
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryCanvas {
    log: Mutex<Vec<Recorded>>,
    fail_after: Option<usize>,
}

impl MemoryCanvas {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept the first `accepted` calls, then reject every later one.
    #[must_use]
    pub fn failing_after(accepted: usize) -> Self {
        Self { log: Mutex::new(Vec::new()), fail_after: Some(accepted) }
    }

    /// Accepted requests in the order they were received.
    #[must_use]
    pub fn recorded(&self) -> Vec<Recorded> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    #[must_use]
    pub fn frames(&self) -> Vec<NewFrame> {
        self.recorded()
            .into_iter()
            .filter_map(|r| match r {
                Recorded::Frame { request, .. } => Some(request),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn notes(&self) -> Vec<NewNote> {
        self.recorded()
            .into_iter()
            .filter_map(|r| match r {
                Recorded::Note { request, .. } => Some(request),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn connectors(&self) -> Vec<NewConnector> {
        self.recorded()
            .into_iter()
            .filter_map(|r| match r {
                Recorded::Connector { request, .. } => Some(request),
                _ => None,
            })
            .collect()
    }

    /// Record under the lock so the fail-after count and the log agree.
    fn record(&self, kind: &'static str, make: impl FnOnce(String) -> Recorded) -> Result<String, CanvasError> {
        let mut log = self.log.lock().unwrap_or_else(PoisonError::into_inner);
        if self.fail_after.is_some_and(|limit| log.len() >= limit) {
            debug!(kind, accepted = log.len(), "memory canvas rejecting call");
            return Err(CanvasError::Rejected { kind });
        }

        let id = Uuid::new_v4().to_string();
        log.push(make(id.clone()));
        debug!(kind, %id, "memory canvas created item");
        Ok(id)
    }
}

#[async_trait::async_trait]
impl CanvasClient for MemoryCanvas {
    async fn create_frame(&self, board_id: &str, frame: &NewFrame) -> Result<String, CanvasError> {
        self.record("frame", |id| Recorded::Frame { id, board_id: board_id.to_string(), request: frame.clone() })
    }

    async fn create_note(&self, board_id: &str, note: &NewNote) -> Result<String, CanvasError> {
        self.record("note", |id| Recorded::Note { id, board_id: board_id.to_string(), request: note.clone() })
    }

    async fn create_connector(&self, board_id: &str, connector: &NewConnector) -> Result<String, CanvasError> {
        self.record("connector", |id| Recorded::Connector {
            id,
            board_id: board_id.to_string(),
            request: connector.clone(),
        })
    }
}
