//! Miro-style REST v2 client.
//!
//! Thin HTTP wrapper for `/boards/{id}/frames`, `/sticky_notes` and
//! `/connectors`. Wire bodies and response parsing are pure functions so they
//! can be tested without a server. Every request first waits on the client's
//! [`RateLimiter`]; an HTTP 429 is retried after `Retry-After` (or an
//! exponential backoff when absent) up to `max_retries` times.

use std::time::Duration;

use reqwest::Url;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use tracing::{debug, warn};

use super::{CanvasClient, CanvasError, NewConnector, NewFrame, NewNote};
use crate::config::CanvasConfig;
use crate::rate_limit::RateLimiter;

/// Backoff ceiling when the server sends no `Retry-After`.
const MAX_BACKOFF_SECS: u64 = 30;

// =============================================================================
// CLIENT
// =============================================================================

pub struct MiroClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    limiter: RateLimiter,
    max_retries: u32,
}

impl MiroClient {
    /// Build a client with its own rate limiter.
    ///
    /// # Errors
    ///
    /// Returns `HttpClientBuild` if the HTTP client cannot be constructed.
    pub fn new(config: &CanvasConfig) -> Result<Self, CanvasError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| CanvasError::HttpClientBuild(e.to_string()))?;
        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            token: config.token.clone(),
            limiter: RateLimiter::new(config.rate_limit),
            max_retries: config.max_retries,
        })
    }

    /// Share a limiter with other clients of the same account.
    #[must_use]
    pub fn with_limiter(mut self, limiter: RateLimiter) -> Self {
        self.limiter = limiter;
        self
    }

    async fn post<B: serde::Serialize + Sync>(
        &self,
        board_id: &str,
        kind: &str,
        body: &B,
    ) -> Result<String, CanvasError> {
        let url = item_url(&self.base_url, board_id, kind)?;
        let mut retries = 0;

        loop {
            self.limiter.acquire().await;

            let response = self
                .http
                .post(url.clone())
                .bearer_auth(&self.token)
                .json(body)
                .send()
                .await
                .map_err(|e| CanvasError::ApiRequest(e.to_string()))?;

            let status = response.status().as_u16();
            let retry_after = retry_after_header(response.headers());
            let text = response
                .text()
                .await
                .map_err(|e| CanvasError::ApiRequest(e.to_string()))?;

            match status {
                200..=299 => {
                    let id = parse_created_id(&text)?;
                    debug!(kind, %id, "canvas item created");
                    return Ok(id);
                }
                429 if retries < self.max_retries => {
                    retries += 1;
                    let wait = retry_after.unwrap_or_else(|| backoff(retries));
                    warn!(kind, attempt = retries, wait_secs = wait.as_secs(), "canvas returned 429; backing off");
                    tokio::time::sleep(wait).await;
                }
                429 => return Err(CanvasError::RateLimited { attempts: retries + 1 }),
                _ => return Err(CanvasError::ApiResponse { status, body: text }),
            }
        }
    }
}

#[async_trait::async_trait]
impl CanvasClient for MiroClient {
    async fn create_frame(&self, board_id: &str, frame: &NewFrame) -> Result<String, CanvasError> {
        self.post(board_id, "frames", &frame_body(frame)).await
    }

    async fn create_note(&self, board_id: &str, note: &NewNote) -> Result<String, CanvasError> {
        self.post(board_id, "sticky_notes", &note_body(note)).await
    }

    async fn create_connector(&self, board_id: &str, connector: &NewConnector) -> Result<String, CanvasError> {
        self.post(board_id, "connectors", &connector_body(connector)).await
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Debug, serde::Serialize)]
struct Position {
    x: f64,
    y: f64,
    origin: &'static str,
}

#[derive(Debug, serde::Serialize)]
struct ItemRef<'a> {
    id: &'a str,
}

#[derive(Debug, serde::Serialize)]
struct FrameBody<'a> {
    data: FrameData<'a>,
    style: FillStyle<'a>,
    position: Position,
    geometry: FrameGeometry,
}

#[derive(Debug, serde::Serialize)]
struct FrameData<'a> {
    title: &'a str,
    format: &'static str,
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct FillStyle<'a> {
    fill_color: &'a str,
}

#[derive(Debug, serde::Serialize)]
struct FrameGeometry {
    width: f64,
    height: f64,
}

#[derive(Debug, serde::Serialize)]
struct NoteBody<'a> {
    data: NoteData<'a>,
    style: FillStyle<'a>,
    position: Position,
    geometry: NoteGeometry,
    parent: ItemRef<'a>,
}

#[derive(Debug, serde::Serialize)]
struct NoteData<'a> {
    content: &'a str,
    shape: &'static str,
}

#[derive(Debug, serde::Serialize)]
struct NoteGeometry {
    width: f64,
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct ConnectorBody<'a> {
    start_item: ItemRef<'a>,
    end_item: ItemRef<'a>,
    style: StrokeStyle<'a>,
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct StrokeStyle<'a> {
    stroke_color: &'a str,
}

#[derive(serde::Deserialize)]
struct CreatedItem {
    id: String,
}

// =============================================================================
// BODIES
// =============================================================================

/// The API positions items by center; frames are laid out by corner.
fn frame_body(frame: &NewFrame) -> FrameBody<'_> {
    FrameBody {
        data: FrameData { title: &frame.title, format: "custom", kind: "freeform" },
        style: FillStyle { fill_color: &frame.fill_hex },
        position: Position {
            x: frame.x + frame.width / 2.0,
            y: frame.y + frame.height / 2.0,
            origin: "center",
        },
        geometry: FrameGeometry { width: frame.width, height: frame.height },
    }
}

fn note_body(note: &NewNote) -> NoteBody<'_> {
    NoteBody {
        data: NoteData { content: &note.text, shape: "square" },
        style: FillStyle { fill_color: &note.color },
        position: Position { x: note.x, y: note.y, origin: "center" },
        geometry: NoteGeometry { width: note.width },
        parent: ItemRef { id: &note.parent_id },
    }
}

fn connector_body(connector: &NewConnector) -> ConnectorBody<'_> {
    ConnectorBody {
        start_item: ItemRef { id: &connector.start_id },
        end_item: ItemRef { id: &connector.end_id },
        style: StrokeStyle { stroke_color: &connector.stroke_hex },
    }
}

// =============================================================================
// PARSING
// =============================================================================

/// `{base}/boards/{board_id}/{kind}` with the board id percent-encoded.
fn item_url(base_url: &str, board_id: &str, kind: &str) -> Result<Url, CanvasError> {
    let mut url = Url::parse(base_url).map_err(|e| CanvasError::ApiRequest(format!("bad base url {base_url}: {e}")))?;
    url.path_segments_mut()
        .map_err(|()| CanvasError::ApiRequest(format!("base url cannot take a path: {base_url}")))?
        .pop_if_empty()
        .extend(["boards", board_id, kind]);
    Ok(url)
}

fn parse_created_id(json: &str) -> Result<String, CanvasError> {
    let item: CreatedItem = serde_json::from_str(json).map_err(|e| CanvasError::ApiParse(e.to_string()))?;
    Ok(item.id)
}

fn retry_after_header(headers: &HeaderMap) -> Option<Duration> {
    parse_retry_after(headers.get(RETRY_AFTER)?.to_str().ok()?)
}

/// Only the delay-seconds form is honored; HTTP dates fall back to backoff.
fn parse_retry_after(raw: &str) -> Option<Duration> {
    raw.trim().parse::<u64>().ok().map(Duration::from_secs)
}

/// 1s, 2s, 4s, ... capped at [`MAX_BACKOFF_SECS`].
fn backoff(attempt: u32) -> Duration {
    let exp = attempt.saturating_sub(1).min(16);
    Duration::from_secs((1_u64 << exp).min(MAX_BACKOFF_SECS))
}

#[cfg(test)]
#[path = "miro_test.rs"]
mod tests;
