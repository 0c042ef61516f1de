//! WebSocket event stream tests against an in-process axum server

use std::net::SocketAddr;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tokio_util::sync::CancellationToken;

use tequila::api::{EventStream, ServerEvent};
use tequila::error::TequilaError;
use tequila::models::GenerationStatus;

const API_KEY: &str = "ws-secret";

async fn start_server(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind");
    let addr = listener.local_addr().expect("no local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });
    addr
}

async fn scripted(ws: WebSocketUpgrade, headers: HeaderMap) -> Response {
    let authorized = headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == API_KEY)
        .unwrap_or(false);
    if !authorized {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    ws.on_upgrade(run_script)
}

async fn run_script(mut socket: WebSocket) {
    let frames = [
        "not json at all",
        r#"{"type":"progress","data":{"week":3,"day":2,"field":9,"totalFields":28,"status":"validating","message":"Validating day 2"}}"#,
    ];
    for frame in frames {
        if socket.send(Message::Text(frame.to_string())).await.is_err() {
            return;
        }
    }

    while let Some(Ok(message)) = socket.recv().await {
        if let Message::Text(text) = message {
            if text == "ping" {
                let _ = socket.send(Message::Text("pong".to_string())).await;
                let _ = socket
                    .send(Message::Text(r#"{"type":"complete","week":3}"#.to_string()))
                    .await;
                break;
            }
        }
    }
    let _ = socket.send(Message::Close(None)).await;
}

async fn silent(ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(|mut socket: WebSocket| async move {
        while let Some(Ok(_)) = socket.recv().await {}
    })
}

#[tokio::test]
async fn test_stream_skips_garbage_and_answers_pings() {
    let addr = start_server(Router::new().route("/ws", get(scripted))).await;

    let mut stream = EventStream::connect(
        &format!("http://{}", addr),
        Some(API_KEY),
        Duration::from_millis(50),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    let first = tokio::time::timeout(Duration::from_secs(5), stream.next())
        .await
        .unwrap()
        .unwrap();
    match first {
        ServerEvent::Progress(progress) => {
            assert_eq!(progress.week, 3);
            assert_eq!(progress.field, 9);
            assert_eq!(progress.status, GenerationStatus::Validating);
        }
        other => panic!("unexpected event {:?}", other),
    }

    let second = tokio::time::timeout(Duration::from_secs(5), stream.next())
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(second, ServerEvent::Complete(ref c) if c.week == Some(3)));

    let end = tokio::time::timeout(Duration::from_secs(5), stream.next())
        .await
        .unwrap();
    assert!(end.is_none());
}

#[tokio::test]
async fn test_rejected_handshake_is_websocket_error() {
    let addr = start_server(Router::new().route("/ws", get(scripted))).await;

    let result = EventStream::connect(
        &format!("http://{}", addr),
        Some("wrong-key"),
        Duration::from_secs(30),
        CancellationToken::new(),
    )
    .await;
    let err = match result {
        Ok(_) => panic!("handshake should be rejected"),
        Err(e) => e,
    };
    assert!(matches!(
        err.downcast_ref::<TequilaError>(),
        Some(TequilaError::WebSocket(_))
    ));
}

#[tokio::test]
async fn test_cancellation_ends_stream() {
    let addr = start_server(Router::new().route("/ws", get(silent))).await;

    let token = CancellationToken::new();
    let mut stream = EventStream::connect(
        &format!("http://{}", addr),
        None,
        Duration::from_secs(30),
        token.clone(),
    )
    .await
    .unwrap();

    token.cancel();
    let end = tokio::time::timeout(Duration::from_secs(5), stream.next())
        .await
        .unwrap();
    assert!(end.is_none());
    stream.close().await;
}
