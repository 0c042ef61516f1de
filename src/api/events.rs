//! WebSocket event stream
//!
//! The backend pushes `progress`, `validation`, `error` and `complete`
//! messages on `/ws`. [`EventStream`] connects, decodes frames into
//! [`ServerEvent`]s on a background task, and keeps the socket alive with a
//! periodic text `ping`. Frames that fail to decode are logged and skipped.

use crate::error::{Result, TequilaError};
use crate::models::GenerationProgress;

use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

/// Validation outcome broadcast after a week is checked
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationEvent {
    /// Week number
    pub week: u32,
    /// Whether the week passed
    #[serde(alias = "is_valid")]
    pub is_valid: bool,
    /// One-line summary
    #[serde(default)]
    pub summary: String,
    /// Number of errors
    #[serde(default, alias = "error_count")]
    pub error_count: u32,
    /// Number of warnings
    #[serde(default, alias = "warning_count")]
    pub warning_count: u32,
}

/// Failure notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEvent {
    /// Week the failure belongs to, when known
    #[serde(default)]
    pub week: Option<u32>,
    /// What went wrong
    #[serde(alias = "error")]
    pub message: String,
}

/// Job completion notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompleteEvent {
    /// Week that finished, when known
    #[serde(default)]
    pub week: Option<u32>,
    /// Status message
    #[serde(default)]
    pub message: Option<String>,
}

/// Message pushed by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerEvent {
    /// Generation progress
    Progress(GenerationProgress),
    /// Validation result
    Validation(ValidationEvent),
    /// Generation failure
    Error(ErrorEvent),
    /// Generation finished
    Complete(CompleteEvent),
}

impl ServerEvent {
    /// Decode one text frame
    ///
    /// Accepts both `{"type": ..., "data": {...}}` envelopes and the flat
    /// `{"type": ..., ...}` form.
    ///
    /// # Errors
    ///
    /// Returns a serialization error for malformed or unknown messages
    pub fn parse(raw: &str) -> Result<Self> {
        let mut value: Value = serde_json::from_str(raw).map_err(TequilaError::Serialization)?;

        if let Some(Value::Object(data)) = value.get("data").cloned() {
            let kind = value.get("type").cloned().unwrap_or(Value::Null);
            let mut flat = data;
            flat.insert("type".to_string(), kind);
            value = Value::Object(flat);
        }

        serde_json::from_value(value).map_err(|e| TequilaError::Serialization(e).into())
    }

    /// Week the event refers to, if any
    pub fn week(&self) -> Option<u32> {
        match self {
            ServerEvent::Progress(p) => Some(p.week),
            ServerEvent::Validation(v) => Some(v.week),
            ServerEvent::Error(e) => e.week,
            ServerEvent::Complete(c) => c.week,
        }
    }
}

/// WebSocket URL for a backend base URL (`http` becomes `ws`, `https` becomes `wss`)
///
/// # Examples
///
/// ```
/// use tequila::api::events::websocket_url;
///
/// assert_eq!(websocket_url("http://localhost:8000").unwrap(), "ws://localhost:8000/ws");
/// assert_eq!(websocket_url("https://api.example.com/").unwrap(), "wss://api.example.com/ws");
/// ```
pub fn websocket_url(base_url: &str) -> Result<String> {
    let mut url = url::Url::parse(base_url)
        .map_err(|e| TequilaError::Config(format!("Invalid base URL {}: {}", base_url, e)))?;
    let scheme = match url.scheme() {
        "http" => "ws",
        "https" => "wss",
        "ws" | "wss" => return Ok(format!("{}/ws", base_url.trim_end_matches('/'))),
        other => {
            return Err(TequilaError::Config(format!("Unsupported URL scheme: {}", other)).into())
        }
    };
    url.set_scheme(scheme)
        .map_err(|_| TequilaError::Config(format!("Cannot convert {} to a WebSocket URL", base_url)))?;
    let path = format!("{}/ws", url.path().trim_end_matches('/'));
    url.set_path(&path);
    Ok(url.to_string())
}

/// Live connection to the backend's event socket
///
/// Dropping the stream cancels the background task and closes the socket.
pub struct EventStream {
    receiver: mpsc::UnboundedReceiver<ServerEvent>,
    cancellation: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl EventStream {
    /// Connect to `{base_url}/ws`
    ///
    /// # Arguments
    ///
    /// * `base_url` - Backend base URL (`http`/`https`)
    /// * `api_key` - Sent as `X-API-Key` during the handshake
    /// * `ping_interval` - Keep-alive interval
    /// * `cancellation` - Stops the stream when cancelled
    ///
    /// # Errors
    ///
    /// Returns [`TequilaError::WebSocket`] if the handshake fails
    pub async fn connect(
        base_url: &str,
        api_key: Option<&str>,
        ping_interval: Duration,
        cancellation: CancellationToken,
    ) -> Result<Self> {
        let url = websocket_url(base_url)?;
        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|e| TequilaError::WebSocket(e.to_string()))?;
        if let Some(key) = api_key {
            let value = HeaderValue::from_str(key)
                .map_err(|e| TequilaError::WebSocket(format!("Invalid API key header: {}", e)))?;
            request.headers_mut().insert("x-api-key", value);
        }

        let (socket, _) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(|e| TequilaError::WebSocket(format!("Failed to connect to {}: {}", url, e)))?;
        tracing::info!("WebSocket connected: {}", url);

        let ping_interval = ping_interval.max(Duration::from_millis(1));
        let (tx, receiver) = mpsc::unbounded_channel();
        let token = cancellation.clone();
        let handle = tokio::spawn(async move {
            run_socket(socket, tx, ping_interval, token).await;
        });

        Ok(Self {
            receiver,
            cancellation,
            handle: Some(handle),
        })
    }

    /// Next decoded event, or `None` once the socket has closed
    pub async fn next(&mut self) -> Option<ServerEvent> {
        self.receiver.recv().await
    }

    /// Close the socket and wait for the background task to finish
    pub async fn close(mut self) {
        self.cancellation.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        self.cancellation.cancel();
    }
}

async fn run_socket<S>(
    socket: S,
    tx: mpsc::UnboundedSender<ServerEvent>,
    ping_interval: Duration,
    cancellation: CancellationToken,
) where
    S: futures::Stream<Item = std::result::Result<Message, tokio_tungstenite::tungstenite::Error>>
        + futures::Sink<Message, Error = tokio_tungstenite::tungstenite::Error>
        + Unpin,
{
    let (mut sink, mut stream) = socket.split();
    let mut ticker = tokio::time::interval_at(
        tokio::time::Instant::now() + ping_interval,
        ping_interval,
    );

    loop {
        tokio::select! {
            biased;

            _ = cancellation.cancelled() => {
                let _ = sink.send(Message::Close(None)).await;
                tracing::debug!("WebSocket closed by client");
                break;
            }

            _ = ticker.tick() => {
                if let Err(e) = sink.send(Message::Text("ping".to_string())).await {
                    tracing::debug!("WebSocket no longer open, stopping pings: {}", e);
                    break;
                }
            }

            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    if text.trim() == "pong" {
                        continue;
                    }
                    match ServerEvent::parse(&text) {
                        Ok(event) => {
                            if tx.send(event).is_err() {
                                break;
                            }
                        }
                        Err(e) => tracing::warn!("Failed to parse WebSocket message: {}", e),
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    tracing::info!("WebSocket closed by server");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!("WebSocket error: {}", e);
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GenerationStatus;

    #[test]
    fn test_parse_flat_progress() {
        let raw = r#"{"type":"progress","week":2,"day":1,"field":3,"totalFields":28,"status":"generating","message":"Day 1"}"#;
        match ServerEvent::parse(raw).unwrap() {
            ServerEvent::Progress(p) => {
                assert_eq!(p.week, 2);
                assert_eq!(p.field, 3);
                assert_eq!(p.status, GenerationStatus::Generating);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_parse_enveloped_progress() {
        let raw = r#"{"type":"progress","data":{"week":4,"day":2,"field":9,"totalFields":28,"status":"validating","message":"checking"}}"#;
        let event = ServerEvent::parse(raw).unwrap();
        assert_eq!(event.week(), Some(4));
        assert!(matches!(event, ServerEvent::Progress(ref p) if p.status == GenerationStatus::Validating));
    }

    #[test]
    fn test_parse_validation_both_spellings() {
        let camel = r#"{"type":"validation","week":1,"isValid":true,"summary":"ok","errorCount":0,"warningCount":2}"#;
        let snake = r#"{"type":"validation","data":{"week":1,"is_valid":true,"summary":"ok"}}"#;
        let a = ServerEvent::parse(camel).unwrap();
        let b = ServerEvent::parse(snake).unwrap();
        assert!(matches!(a, ServerEvent::Validation(ref v) if v.is_valid && v.warning_count == 2));
        assert!(matches!(b, ServerEvent::Validation(ref v) if v.is_valid));
    }

    #[test]
    fn test_parse_error_event() {
        let flat = r#"{"type":"error","week":3,"message":"LLM quota exceeded"}"#;
        let enveloped = r#"{"type":"error","data":{"error":"socket failure"}}"#;
        assert!(matches!(
            ServerEvent::parse(flat).unwrap(),
            ServerEvent::Error(ErrorEvent { week: Some(3), .. })
        ));
        match ServerEvent::parse(enveloped).unwrap() {
            ServerEvent::Error(e) => assert_eq!(e.message, "socket failure"),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_parse_complete_event() {
        let event = ServerEvent::parse(r#"{"type":"complete","week":7}"#).unwrap();
        assert_eq!(event.week(), Some(7));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(ServerEvent::parse("not json").is_err());
        assert!(ServerEvent::parse(r#"{"type":"unknown"}"#).is_err());
    }

    #[test]
    fn test_websocket_url() {
        assert_eq!(
            websocket_url("http://localhost:8000").unwrap(),
            "ws://localhost:8000/ws"
        );
        assert_eq!(
            websocket_url("https://host/prefix/").unwrap(),
            "wss://host/prefix/ws"
        );
        assert!(websocket_url("ftp://host").is_err());
    }
}
