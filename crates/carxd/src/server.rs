//! HTTP server for carxd

use crate::metrics::RequestMetrics;
use crate::routes;
use anyhow::Result;
use axum::Router;
use carx_common::{CarxConfig, OllamaClient, ResponseGenerator, SessionStore};
use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing::info;

/// How often idle sessions are swept in the background
const SWEEP_INTERVAL_SECS: u64 = 60;

/// Application state shared across handlers
pub struct AppState {
    pub generator: ResponseGenerator,
    /// Held only to read or write a session, never across a model call
    pub sessions: Arc<Mutex<SessionStore>>,
    /// Present only when `[llm] enabled = true`
    pub llm: Option<OllamaClient>,
    pub llm_timeout: Duration,
    pub start_time: Instant,
    pub metrics: RequestMetrics,
}

impl AppState {
    pub fn new(config: &CarxConfig) -> Self {
        let llm = config.llm.enabled.then(|| OllamaClient::new(&config.llm));
        Self {
            generator: ResponseGenerator::new(config),
            sessions: Arc::new(Mutex::new(SessionStore::from_config(&config.session))),
            llm,
            llm_timeout: Duration::from_secs(config.llm.response_timeout_secs),
            start_time: Instant::now(),
            metrics: RequestMetrics::new(),
        }
    }
}

/// Build the router without binding, so tests can drive it directly
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(routes::chat_routes())
        .merge(routes::tool_routes())
        .merge(routes::vehicle_routes())
        .merge(routes::health_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Run the HTTP server until Ctrl-C
pub async fn run(config: &CarxConfig) -> Result<()> {
    let state = Arc::new(AppState::new(config));

    if let Some(llm) = &state.llm {
        if llm.is_available().await {
            info!(
                "  Ollama reachable at {} (model {})",
                llm.base_url(),
                llm.model()
            );
        } else {
            tracing::warn!(
                "  Ollama not reachable at {}, rule engine only",
                llm.base_url()
            );
        }
    }

    spawn_sweeper(Arc::clone(&state.sessions));

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!("  Listening on http://{}", config.server.bind);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

fn spawn_sweeper(sessions: Arc<Mutex<SessionStore>>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(SWEEP_INTERVAL_SECS));
        loop {
            ticker.tick().await;
            sessions.lock().await.sweep_expired(Utc::now());
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("  Cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down gracefully");
}
