//! Generation tracker and usage polling against a mock backend

mod common;

use serde_json::json;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tequila::generation::GenerationTracker;
use tequila::models::GenerationStatus;
use tequila::usage::{UsageMonitor, UsagePoller};

use common::{api_path, client_for};

fn hydrated(week: u32) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "week": week,
        "components": {
            "spec": format!("week{:02}/spec", week),
            "role_context": format!("week{:02}/role_context.json", week),
            "assets": [],
            "days": [{"week": week, "day": 1, "status": "complete"}]
        },
        "validation": {"is_valid": true, "summary": "ok", "error_count": 0, "warning_count": 0}
    }))
}

#[tokio::test]
async fn test_range_continues_past_failed_week() {
    let server = MockServer::start().await;
    for week in [5, 7] {
        Mock::given(method("POST"))
            .and(path(api_path(&format!("/gen/weeks/{}/hydrate", week))))
            .respond_with(hydrated(week))
            .expect(1)
            .mount(&server)
            .await;
    }
    Mock::given(method("POST"))
        .and(path(api_path("/gen/weeks/6/hydrate")))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"detail": "LLM provider error"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let tracker = GenerationTracker::new(client_for(&server));
    let results = tracker.generate_week_range(5, 7).await;

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].week, 5);
    assert_eq!(results[1].week, 7);

    let state = tracker.state();
    assert!(!state.generating);
    assert_eq!(state.result.map(|r| r.week), Some(7));
    assert_eq!(state.progress.unwrap().status, GenerationStatus::Completed);
    server.verify().await;
}

#[tokio::test]
async fn test_failed_generation_then_reset() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(api_path("/gen/weeks/4/hydrate")))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({"message": "busy"})))
        .mount(&server)
        .await;

    let tracker = GenerationTracker::new(client_for(&server));
    let err = tracker.generate_week(4).await.unwrap_err();
    assert_eq!(err.to_string(), "busy");
    assert_eq!(tracker.state().error.as_deref(), Some("busy"));

    tracker.reset();
    let state = tracker.state();
    assert!(!state.generating);
    assert!(state.progress.is_none());
    assert!(state.error.is_none());
    assert!(state.result.is_none());
}

#[tokio::test]
async fn test_cancelled_generation_leaves_no_final_record() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(api_path("/gen/weeks/9/hydrate")))
        .respond_with(hydrated(9).set_delay(Duration::from_secs(10)))
        .mount(&server)
        .await;

    let token = CancellationToken::new();
    let tracker = GenerationTracker::new(client_for(&server)).with_cancellation(token.clone());

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();
    });
    let err = tracker.generate_week(9).await.unwrap_err();
    canceller.await.unwrap();

    assert!(tequila::error::is_cancelled(&err));
    let state = tracker.state();
    assert!(state.result.is_none());
    assert!(state.error.is_none());
}

#[tokio::test]
async fn test_usage_monitor_reset_reloads() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(api_path("/usage/reset")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "reset"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(api_path("/usage")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_requests": 0,
            "total_tokens": 0,
            "total_cost_usd": 0.0
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut monitor = UsageMonitor::new(client_for(&server));
    let snapshot = monitor.reset().await.unwrap();
    assert_eq!(snapshot.stats.total_requests, 0);
    server.verify().await;
}

#[tokio::test]
async fn test_usage_poller_polls_until_stopped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(api_path("/usage")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_requests": 12,
            "total_tokens": 3400,
            "total_cost": 0.42,
            "breakdown": {"openai": {"requests": 12}}
        })))
        .mount(&server)
        .await;

    let parent = CancellationToken::new();
    let poller = UsagePoller::spawn(client_for(&server), Duration::from_millis(20), &parent);
    let mut receiver = poller.subscribe();

    for _ in 0..2 {
        tokio::time::timeout(Duration::from_secs(5), receiver.changed())
            .await
            .expect("poll timed out")
            .unwrap();
    }
    let latest = poller.latest().unwrap();
    assert_eq!(latest.stats.total_tokens, 3400);
    assert!(latest.stats.breakdown.contains_key("openai"));

    poller.stop().await;
    let polled = server.received_requests().await.unwrap().len();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(server.received_requests().await.unwrap().len(), polled);
}
