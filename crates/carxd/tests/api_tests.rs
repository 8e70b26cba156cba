//! End-to-end tests for the HTTP chat adapter.
//!
//! Drives the router in-process with `oneshot`. The model tests point the
//! client at a local listener that accepts connections and never answers.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use carx_common::CarxConfig;
use carxd::routes::{ChatResponse, HealthResponse};
use carxd::server::{app, AppState};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower::ServiceExt;

fn test_app() -> (Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(&CarxConfig::default()));
    (app(Arc::clone(&state)), state)
}

async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Vec<u8>) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

async fn chat(app: Router, session_id: &str, message: &str) -> ChatResponse {
    let (status, body) = post_json(
        app,
        "/api/v2/car-expert",
        json!({ "session_id": session_id, "message": message }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_emergency_chat() {
    let (app, _) = test_app();
    let reply = chat(app, "s1", "My car won't start, help!").await;
    assert!(reply.reply.starts_with("🚨 EMERGENCY / طوارئ 🚨"));
    assert!(reply.reply.contains("122"));
    let response = reply.response.unwrap();
    assert_eq!(response.emergency_contacts.len(), 2);
}

#[tokio::test]
async fn test_arabic_cost_chat() {
    let (app, _) = test_app();
    let reply = chat(app, "s2", "كم تكلفة تغيير الفرامل").await;
    let response = reply.response.unwrap();
    assert_eq!(response.intent.as_str(), "cost");
    assert!(response.cost_estimate.is_some());
    assert!(reply.reply.contains("جنيه"));
}

#[tokio::test]
async fn test_empty_message_prompts_in_both_languages() {
    let (app, state) = test_app();
    let reply = chat(app, "s3", "   ").await;
    assert_eq!(
        reply.reply,
        "Please enter your question. / يرجى إدخال سؤالك."
    );
    assert!(reply.response.is_none());
    // No session is created for an empty message
    assert!(state.sessions.lock().await.is_empty());
}

#[tokio::test]
async fn test_missing_session_id_gets_one() {
    let (app, _) = test_app();
    let (status, body) = post_json(
        app,
        "/api/v2/car-expert",
        json!({ "message": "Tell me about brakes" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let reply: ChatResponse = serde_json::from_slice(&body).unwrap();
    assert!(uuid::Uuid::parse_str(&reply.session_id).is_ok());
}

#[tokio::test]
async fn test_exchanges_are_recorded_per_session() {
    let (app, state) = test_app();
    chat(app.clone(), "s4", "كم تكلفة تغيير الفرامل").await;
    chat(app, "s4", "the radio is broken").await;

    let sessions = state.sessions.lock().await;
    let session = sessions.get("s4").unwrap();
    assert_eq!(session.message_count, 2);
    assert_eq!(session.context.len(), 2);
    assert_eq!(session.last_query.as_deref(), Some("the radio is broken"));
    assert_eq!(session.language.as_str(), "en");
}

#[tokio::test]
async fn test_error_reply_is_prefixed() {
    let (app, _) = test_app();
    let reply = chat(app, "s5", "the radio is broken").await;
    assert!(reply.reply.starts_with("❌"));
    let response = reply.response.unwrap();
    assert_eq!(response.error_code.as_deref(), Some("DiagnosticError"));
}

#[tokio::test]
async fn test_vehicle_then_maintenance_question() {
    let (app, _) = test_app();
    let (status, _) = post_json(
        app.clone(),
        "/api/v2/vehicles",
        json!({
            "session_id": "s6",
            "vehicle_id": "car1",
            "make": "BMW",
            "model": "320i",
            "year": 2020,
            "mileage": 50000
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let reply = chat(app, "s6", "When should I change my oil?").await;
    assert!(reply.reply.contains("BMW 320i (car1)"));
}

#[tokio::test]
async fn test_diagnostics_endpoint() {
    let (app, _) = test_app();
    let (status, body) = post_json(
        app.clone(),
        "/api/v2/diagnostics",
        json!({ "system": "engine", "symptom": "starting", "sub_symptom": "no_crank" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let result: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(result["possible_causes"][0]["part"], "battery");
    assert_eq!(result["confidence_level"], "high");

    let (status, body) = post_json(
        app,
        "/api/v2/diagnostics",
        json!({ "system": "engine", "symptom": "starting", "sub_symptom": "overheat" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(String::from_utf8(body).unwrap().contains("overheat"));
}

#[tokio::test]
async fn test_cost_endpoint() {
    let (app, _) = test_app();
    let (status, body) = post_json(
        app.clone(),
        "/api/v2/cost",
        json!({ "repair_type": "oil_change", "emergency": true }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let estimate: Value = serde_json::from_slice(&body).unwrap();
    // (800 + 150) x 1.5
    assert_eq!(estimate["total_cost"], 1425.0);

    let (status, _) = post_json(app, "/api/v2/cost", json!({ "repair_type": "paint_job" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_maintenance_endpoint() {
    let (app, _) = test_app();
    let (status, body) = post_json(
        app.clone(),
        "/api/v2/maintenance",
        json!({
            "service_type": "timing_belt",
            "current_mileage": 100000,
            "vehicle_category": "luxury"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let projection: Value = serde_json::from_slice(&body).unwrap();
    assert!(projection["next_service_km"].as_u64().unwrap() > 100_000);

    let (status, _) = post_json(
        app,
        "/api/v2/maintenance",
        json!({ "service_type": "wipers", "current_mileage": 1000 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

async fn get_health(app: Router) -> HealthResponse {
    let request = Request::builder()
        .uri("/api/v2/health")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health() {
    let (app, _) = test_app();
    let health = get_health(app).await;
    assert_eq!(health.status, "healthy");
    assert!(!health.llm_enabled);
    assert_eq!(health.active_sessions, 0);
    assert_eq!(health.metrics.requests, 0);
}

#[tokio::test]
async fn test_health_reports_chat_metrics() {
    let (app, _) = test_app();
    chat(app.clone(), "m1", "the radio is broken").await;
    chat(app.clone(), "m1", "Tell me about brakes").await;
    chat(app.clone(), "m2", "الراديو عطلان").await;
    // Empty messages are not counted
    chat(app.clone(), "m3", "").await;

    let health = get_health(app).await;
    assert_eq!(health.active_sessions, 2);
    let metrics = &health.metrics;
    assert_eq!(metrics.requests, 3);
    assert_eq!(metrics.errors.get("DiagnosticError"), Some(&2));
    assert_eq!(metrics.errors.len(), 1);
    assert!(metrics.max_response_ms >= metrics.avg_response_ms);
}

/// A model endpoint that accepts connections and never replies.
/// The receiver fires once per accepted connection.
async fn silent_model() -> (SocketAddr, mpsc::Receiver<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (accepted_tx, accepted_rx) = mpsc::channel(8);
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
            let _ = accepted_tx.try_send(());
        }
    });
    (addr, accepted_rx)
}

fn app_with_model(addr: SocketAddr, timeout_secs: u64) -> (Router, Arc<AppState>) {
    let mut config = CarxConfig::default();
    config.llm.enabled = true;
    config.llm.endpoint = format!("http://{}", addr);
    config.llm.response_timeout_secs = timeout_secs;
    let state = Arc::new(AppState::new(&config));
    (app(Arc::clone(&state)), state)
}

#[tokio::test]
async fn test_model_wait_does_not_block_other_sessions() {
    let (addr, mut accepted) = silent_model().await;
    let (app, state) = app_with_model(addr, 30);

    let waiting = tokio::spawn(chat(app.clone(), "a", "Tell me about turbochargers"));
    accepted.recv().await.unwrap();

    let limit = Duration::from_secs(2);
    let reply = tokio::time::timeout(limit, chat(app.clone(), "b", "How much is an oil change?"))
        .await
        .expect("chat for another session waited on the model");
    assert!(reply.response.unwrap().cost_estimate.is_some());

    let health = tokio::time::timeout(limit, get_health(app.clone()))
        .await
        .expect("health check waited on the model");
    assert!(health.llm_enabled);
    assert_eq!(health.active_sessions, 2);

    // The session store itself is free too
    let sessions = tokio::time::timeout(limit, state.sessions.lock())
        .await
        .expect("session store locked during the model call");
    assert_eq!(sessions.get("b").unwrap().message_count, 1);
    drop(sessions);

    assert!(!waiting.is_finished());
    waiting.abort();
}

#[tokio::test]
async fn test_model_timeout_keeps_rule_reply() {
    let (addr, _accepted) = silent_model().await;
    let (app, state) = app_with_model(addr, 1);

    let reply = chat(app.clone(), "t", "Tell me about turbochargers").await;
    let response = reply.response.unwrap();
    assert!(response.model.is_none());
    assert!(reply.reply.contains("didn't fully understand"));

    let sessions = state.sessions.lock().await;
    assert_eq!(sessions.get("t").unwrap().message_count, 1);
    drop(sessions);

    let health = get_health(app).await;
    assert_eq!(health.metrics.errors.get("LlmError"), Some(&1));
    assert_eq!(health.metrics.requests, 1);
}
