use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use super::*;
use crate::config::{CanvasConfig, CanvasTimeouts};
use crate::error::ErrorCode;
use crate::rate_limit::RateLimitConfig;

fn test_config(base_url: &str, max_retries: u32) -> CanvasConfig {
    CanvasConfig {
        token: "test-token".into(),
        base_url: base_url.into(),
        rate_limit: RateLimitConfig::default(),
        max_retries,
        timeouts: CanvasTimeouts { request_secs: 5, connect_secs: 5 },
    }
}

fn sample_frame() -> NewFrame {
    NewFrame { title: "^A$".into(), fill_hex: "#f0939d".into(), x: 0.0, y: 0.0, width: 2000.0, height: 270.0 }
}

fn http_response(status: &str, extra_headers: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n{extra_headers}\r\n{body}",
        body.len()
    )
}

fn content_length(head: &str) -> usize {
    head.lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse().ok())
        .unwrap_or(0)
}

async fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0_u8; 4096];
    loop {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..end]).to_string();
            if buf.len() >= end + 4 + content_length(&head) {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).to_string()
}

/// Serve one canned response per connection, returning the raw requests.
async fn serve(responses: Vec<String>) -> (String, tokio::task::JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let mut requests = Vec::new();
        for response in responses {
            let (mut stream, _) = listener.accept().await.unwrap();
            requests.push(read_request(&mut stream).await);
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();
        }
        requests
    });
    (format!("http://{addr}/v2"), handle)
}

// =============================================================================
// PURE HELPERS
// =============================================================================

#[test]
fn frame_body_positions_by_center() {
    let body = serde_json::to_value(frame_body(&sample_frame())).unwrap();
    assert_eq!(
        body,
        serde_json::json!({
            "data": { "title": "^A$", "format": "custom", "type": "freeform" },
            "style": { "fillColor": "#f0939d" },
            "position": { "x": 1000.0, "y": 135.0, "origin": "center" },
            "geometry": { "width": 2000.0, "height": 270.0 }
        })
    );
}

#[test]
fn note_body_references_parent() {
    let note = NewNote {
        parent_id: "frame-1".into(),
        text: "A".into(),
        color: "red".into(),
        x: 100.0,
        y: 135.0,
        width: 200.0,
    };
    let body = serde_json::to_value(note_body(&note)).unwrap();
    assert_eq!(body["parent"]["id"], "frame-1");
    assert_eq!(body["data"]["content"], "A");
    assert_eq!(body["style"]["fillColor"], "red");
    assert_eq!(body["position"]["x"], 100.0);
    assert_eq!(body["geometry"]["width"], 200.0);
}

#[test]
fn connector_body_uses_camel_case() {
    let connector = NewConnector { start_id: "n1".into(), end_id: "n2".into(), stroke_hex: "#808080".into() };
    let body = serde_json::to_value(connector_body(&connector)).unwrap();
    assert_eq!(
        body,
        serde_json::json!({
            "startItem": { "id": "n1" },
            "endItem": { "id": "n2" },
            "style": { "strokeColor": "#808080" }
        })
    );
}

#[test]
fn item_url_appends_board_path() {
    let url = item_url("https://api.miro.com/v2", "uXjV=", "frames").unwrap();
    assert_eq!(url.as_str(), "https://api.miro.com/v2/boards/uXjV=/frames");

    let url = item_url("https://api.miro.com/v2/", "a/b", "connectors").unwrap();
    assert_eq!(url.as_str(), "https://api.miro.com/v2/boards/a%2Fb/connectors");
}

#[test]
fn item_url_rejects_bad_base() {
    let err = item_url("not a url", "b", "frames").unwrap_err();
    assert!(matches!(err, CanvasError::ApiRequest(_)));
}

#[test]
fn parse_created_id_reads_id() {
    assert_eq!(parse_created_id(r#"{"id":"3458764","type":"frame"}"#).unwrap(), "3458764");
}

#[test]
fn parse_created_id_rejects_bad_json() {
    let err = parse_created_id("not json").unwrap_err();
    assert!(matches!(err, CanvasError::ApiParse(_)));
    assert_eq!(err.error_code(), "E_CANVAS_PARSE");
}

#[test]
fn parse_retry_after_accepts_seconds_only() {
    assert_eq!(parse_retry_after(" 3 "), Some(Duration::from_secs(3)));
    assert_eq!(parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT"), None);
}

#[test]
fn backoff_doubles_and_caps() {
    assert_eq!(backoff(1), Duration::from_secs(1));
    assert_eq!(backoff(2), Duration::from_secs(2));
    assert_eq!(backoff(4), Duration::from_secs(8));
    assert_eq!(backoff(10), Duration::from_secs(MAX_BACKOFF_SECS));
}

// =============================================================================
// HTTP
// =============================================================================

#[tokio::test]
async fn create_frame_posts_with_bearer_token() {
    let (base, server) = serve(vec![http_response("201 Created", "", r#"{"id":"f-1"}"#)]).await;
    let client = MiroClient::new(&test_config(&base, 0)).unwrap();

    let id = client.create_frame("board-1", &sample_frame()).await.unwrap();
    assert_eq!(id, "f-1");

    let requests = server.await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].starts_with("POST /v2/boards/board-1/frames "));
    assert!(requests[0].to_ascii_lowercase().contains("authorization: bearer test-token"));
    assert!(requests[0].contains(r##""fillColor":"#f0939d""##));
}

#[tokio::test]
async fn rate_limited_response_is_retried() {
    let (base, server) = serve(vec![
        http_response("429 Too Many Requests", "Retry-After: 0\r\n", "{}"),
        http_response("201 Created", "", r#"{"id":"c-1"}"#),
    ])
    .await;
    let client = MiroClient::new(&test_config(&base, 2)).unwrap();
    let connector = NewConnector { start_id: "a".into(), end_id: "b".into(), stroke_hex: "#000000".into() };

    let id = client.create_connector("board-1", &connector).await.unwrap();
    assert_eq!(id, "c-1");
    assert_eq!(server.await.unwrap().len(), 2);
}

#[tokio::test]
async fn retries_are_bounded() {
    let limited = http_response("429 Too Many Requests", "Retry-After: 0\r\n", "{}");
    let (base, server) = serve(vec![limited.clone(), limited.clone(), limited]).await;
    let client = MiroClient::new(&test_config(&base, 2)).unwrap();

    let err = client.create_frame("board-1", &sample_frame()).await.unwrap_err();
    assert_eq!(err, CanvasError::RateLimited { attempts: 3 });
    assert!(err.retryable());
    assert_eq!(server.await.unwrap().len(), 3);
}

#[tokio::test]
async fn error_status_is_not_retried() {
    let (base, server) = serve(vec![http_response("400 Bad Request", "", r#"{"message":"bad"}"#)]).await;
    let client = MiroClient::new(&test_config(&base, 5)).unwrap();

    let err = client.create_frame("board-1", &sample_frame()).await.unwrap_err();
    assert!(matches!(&err, CanvasError::ApiResponse { status: 400, body } if body.contains("bad")));
    assert!(!err.retryable());
    assert_eq!(server.await.unwrap().len(), 1);
}

#[tokio::test]
async fn shared_limiter_counts_every_call() {
    let (base, server) = serve(vec![
        http_response("201 Created", "", r#"{"id":"n-1"}"#),
        http_response("201 Created", "", r#"{"id":"n-2"}"#),
    ])
    .await;
    let limiter = RateLimiter::default();
    let client = MiroClient::new(&test_config(&base, 0)).unwrap().with_limiter(limiter.clone());
    let note = NewNote { parent_id: "f".into(), text: "A".into(), color: "red".into(), x: 0.0, y: 0.0, width: 200.0 };

    client.create_note("board-1", &note).await.unwrap();
    client.create_note("board-1", &note).await.unwrap();
    assert_eq!(limiter.recorded(), 2);
    assert_eq!(server.await.unwrap().len(), 2);
}
