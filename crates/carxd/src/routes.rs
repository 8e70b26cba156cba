//! API routes for carxd
//!
//! v2.0.0: /api/v2/car-expert chat endpoint with server-side sessions
//! v2.2.0: Direct tool endpoints (diagnostics, maintenance, cost)
//! v2.4.0: /api/v2/vehicles so a chat session can carry a garage
//! v2.5.0: Optional model answer for questions the rules cannot answer
//! v2.5.1: Session store is released while the model answers; chat
//! response times and error codes reported by /api/v2/health

use crate::metrics::MetricsSnapshot;
use crate::server::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use carx_common::responder::EMPTY_MESSAGE_PROMPT;
use carx_common::{
    CarxError, CostEstimate, DiagnosisResult, DrivingCondition, Exchange, QualityTier,
    QueryAnalysis, Response, ServiceProjection, SessionUpdate, ShopTier, VehicleCategory,
    VehicleDetails, VehicleRecord,
};
use chrono::{Local, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

type AppStateArc = Arc<AppState>;

fn bad_request(e: CarxError) -> (StatusCode, String) {
    warn!("  Request rejected: {}", e);
    (StatusCode::BAD_REQUEST, e.to_string())
}

// ============================================================================
// Chat Route
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// New anonymous session when absent
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub session_id: String,
    /// Rendered chat text
    pub reply: String,
    /// Structured reply; absent for empty messages
    pub response: Option<Response>,
}

pub fn chat_routes() -> Router<AppStateArc> {
    Router::new().route("/api/v2/car-expert", post(car_expert))
}

async fn car_expert(
    State(state): State<AppStateArc>,
    Json(req): Json<ChatRequest>,
) -> Json<ChatResponse> {
    let session_id = req
        .session_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let message = req.message.trim().to_string();

    if message.is_empty() {
        return Json(ChatResponse {
            session_id,
            reply: EMPTY_MESSAGE_PROMPT.to_string(),
            response: None,
        });
    }

    let started = Instant::now();
    let analysis = state.generator.analyzer().analyze(&message);
    let mut response = {
        let mut sessions = state.sessions.lock().await;
        let session = sessions.get_or_create(&session_id);
        state.generator.respond(&analysis, &session.profile)
    };

    // Other sessions keep being served while the model answers
    if response.needs_model_answer() {
        ask_model(&state, &analysis, &mut response).await;
    }

    let mut sessions = state.sessions.lock().await;
    // Recreated if it expired while the model was answering
    sessions.get_or_create(&session_id);
    sessions.update(
        &session_id,
        SessionUpdate {
            language: Some(analysis.language),
            last_query: Some(message.clone()),
            ..Default::default()
        },
    );
    sessions.record_exchange(
        &session_id,
        Exchange {
            timestamp: Utc::now(),
            query: message,
            intent: analysis.intent,
            reply_kind: response.kind,
        },
    );
    drop(sessions);

    if let Some(code) = &response.error_code {
        state.metrics.record_error(code);
    }
    state.metrics.record_request(started.elapsed());

    info!(
        "  {} {} [{}] -> {:?}",
        session_id,
        analysis.intent.indicator(),
        analysis.language,
        response.kind
    );

    Json(ChatResponse {
        session_id,
        reply: response.render(),
        response: Some(response),
    })
}

/// Any model failure keeps the rule-based reply
async fn ask_model(state: &AppState, analysis: &QueryAnalysis, response: &mut Response) {
    let Some(llm) = &state.llm else { return };
    let pending = llm.answer(&analysis.text, analysis.language);
    let answer = tokio::time::timeout(state.llm_timeout, pending)
        .await
        .unwrap_or_else(|_| {
            Err(CarxError::Llm(format!(
                "Model answer timed out after {:?}",
                state.llm_timeout
            )))
        });
    match answer {
        Ok(answer) => response.apply_model_answer(llm.model(), answer),
        Err(e) => {
            warn!("  Model answer failed: {}", e);
            state.metrics.record_error(e.code());
        }
    }
}

// ============================================================================
// Tool Routes
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct DiagnoseRequest {
    pub system: String,
    pub symptom: String,
    pub sub_symptom: String,
}

#[derive(Debug, Deserialize)]
pub struct MaintenanceRequest {
    pub service_type: String,
    pub current_mileage: u64,
    #[serde(default = "default_category")]
    pub vehicle_category: String,
    #[serde(default = "default_condition")]
    pub driving_condition: String,
}

fn default_category() -> String {
    "economy".to_string()
}

fn default_condition() -> String {
    "normal".to_string()
}

#[derive(Debug, Deserialize)]
pub struct CostRequest {
    pub repair_type: String,
    #[serde(default = "default_tier")]
    pub quality: String,
    #[serde(default)]
    pub emergency: bool,
    #[serde(default = "default_tier")]
    pub shop: String,
}

fn default_tier() -> String {
    "standard".to_string()
}

pub fn tool_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/api/v2/diagnostics", post(diagnose))
        .route("/api/v2/maintenance", post(maintenance))
        .route("/api/v2/cost", post(cost))
}

async fn diagnose(
    State(state): State<AppStateArc>,
    Json(req): Json<DiagnoseRequest>,
) -> Result<Json<DiagnosisResult>, (StatusCode, String)> {
    state
        .generator
        .diagnostics()
        .diagnose(&req.system, &req.symptom, &req.sub_symptom)
        .map(Json)
        .map_err(bad_request)
}

async fn maintenance(
    State(state): State<AppStateArc>,
    Json(req): Json<MaintenanceRequest>,
) -> Result<Json<ServiceProjection>, (StatusCode, String)> {
    let category: VehicleCategory = req.vehicle_category.parse().map_err(bad_request)?;
    let condition: DrivingCondition = req.driving_condition.parse().map_err(bad_request)?;
    state
        .generator
        .scheduler()
        .next_service(&req.service_type, req.current_mileage, category, condition)
        .map(Json)
        .map_err(bad_request)
}

async fn cost(
    State(state): State<AppStateArc>,
    Json(req): Json<CostRequest>,
) -> Result<Json<CostEstimate>, (StatusCode, String)> {
    let quality: QualityTier = req.quality.parse().map_err(bad_request)?;
    let shop: ShopTier = req.shop.parse().map_err(bad_request)?;
    state
        .generator
        .costs()
        .estimate(&req.repair_type, quality, req.emergency, shop)
        .map(Json)
        .map_err(bad_request)
}

// ============================================================================
// Vehicle Routes (v2.4.0)
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AddVehicleRequest {
    pub session_id: String,
    pub vehicle_id: String,
    #[serde(flatten)]
    pub details: VehicleDetails,
}

pub fn vehicle_routes() -> Router<AppStateArc> {
    Router::new().route("/api/v2/vehicles", post(add_vehicle))
}

async fn add_vehicle(
    State(state): State<AppStateArc>,
    Json(req): Json<AddVehicleRequest>,
) -> Result<Json<VehicleRecord>, (StatusCode, String)> {
    let mut sessions = state.sessions.lock().await;
    let session = sessions.get_or_create(&req.session_id);
    let today = Local::now().date_naive();

    session
        .profile
        .add_vehicle(&req.vehicle_id, req.details, today)
        .map_err(bad_request)?;

    session
        .profile
        .vehicles
        .get(&req.vehicle_id)
        .cloned()
        .map(Json)
        .ok_or_else(|| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Vehicle was not stored".to_string(),
            )
        })
}

// ============================================================================
// Health Routes
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub active_sessions: usize,
    pub llm_enabled: bool,
    pub metrics: MetricsSnapshot,
}

pub fn health_routes() -> Router<AppStateArc> {
    Router::new().route("/api/v2/health", get(health_check))
}

async fn health_check(State(state): State<AppStateArc>) -> Json<HealthResponse> {
    let active_sessions = state.sessions.lock().await.len();
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        active_sessions,
        llm_enabled: state.llm.is_some(),
        metrics: state.metrics.snapshot(),
    })
}
