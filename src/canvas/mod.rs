//! Canvas collaborator: the remote board that frames, notes and connectors
//! are created on.
//!
//! DESIGN
//! ======
//! [`CanvasClient`] is the only seam between the plan and the network. Each
//! call creates one item and returns the id the canvas assigned to it; ids are
//! opaque strings. [`miro::MiroClient`] talks to a Miro-style REST API and
//! [`memory::MemoryCanvas`] records requests in process for tests and dry
//! runs.
//!
//! Geometry in the request types is in canvas pixels. Frame coordinates are
//! the top-left corner on the board; note coordinates are the note center,
//! relative to the parent frame's top-left corner.

pub mod memory;
pub mod miro;

use serde::Serialize;

use crate::error::ErrorCode;

pub use memory::{MemoryCanvas, Recorded};
pub use miro::MiroClient;

// =============================================================================
// ERROR TYPE
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CanvasError {
    /// The HTTP request could not be sent or its body not read.
    #[error("canvas request failed: {0}")]
    ApiRequest(String),

    /// The canvas returned a non-success HTTP status.
    #[error("canvas response error: status {status}")]
    ApiResponse { status: u16, body: String },

    /// The canvas response body could not be deserialized.
    #[error("canvas response parse failed: {0}")]
    ApiParse(String),

    /// Still rate limited after exhausting retries.
    #[error("canvas rate limited after {attempts} attempts")]
    RateLimited { attempts: u32 },

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    /// The in-memory canvas was told to reject this call.
    #[error("canvas rejected {kind} request")]
    Rejected { kind: &'static str },
}

impl ErrorCode for CanvasError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::ApiRequest(_) => "E_CANVAS_REQUEST",
            Self::ApiResponse { .. } => "E_CANVAS_RESPONSE",
            Self::ApiParse(_) => "E_CANVAS_PARSE",
            Self::RateLimited { .. } => "E_CANVAS_RATE_LIMITED",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
            Self::Rejected { .. } => "E_CANVAS_REJECTED",
        }
    }

    fn retryable(&self) -> bool {
        matches!(
            self,
            Self::ApiRequest(_) | Self::RateLimited { .. } | Self::ApiResponse { status: 429 | 500..=599, .. }
        )
    }
}

// =============================================================================
// REQUESTS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewFrame {
    pub title: String,
    /// Fill as `#rrggbb`.
    pub fill_hex: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewNote {
    pub parent_id: String,
    pub text: String,
    /// Sticky-note color name (`red`, `light_blue`, ...).
    pub color: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewConnector {
    pub start_id: String,
    pub end_id: String,
    /// Stroke as `#rrggbb`.
    pub stroke_hex: String,
}

// =============================================================================
// CLIENT TRAIT
// =============================================================================

/// Creates items on a board. Implementations must be safe to call
/// concurrently.
#[async_trait::async_trait]
pub trait CanvasClient: Send + Sync {
    async fn create_frame(&self, board_id: &str, frame: &NewFrame) -> Result<String, CanvasError>;

    async fn create_note(&self, board_id: &str, note: &NewNote) -> Result<String, CanvasError>;

    async fn create_connector(&self, board_id: &str, connector: &NewConnector) -> Result<String, CanvasError>;
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
