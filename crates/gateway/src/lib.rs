//! HTTP API gateway for LexClaw.
//!
//! Exposes the pairing flow, the bot configuration and the conversation
//! engine to the pairing UI and chat UI.
//!
//! Built on Axum for high performance async HTTP.

pub mod api;
pub mod bridge;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use axum::{
    Router,
    extract::State,
    response::Json,
    routing::{get, post},
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::info;

use lexclaw_agent::{ResponderClient, SessionRegistry};
use lexclaw_channels::PairingService;
use lexclaw_config::{AppConfig, ConfigError};
use lexclaw_core::bot::BotConfigHandle;
use lexclaw_core::channel::PairingStatus;
use lexclaw_core::event::EventBus;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub pairing: Arc<PairingService>,
    pub sessions: Arc<SessionRegistry>,
    pub events: Arc<EventBus>,
    pub start_time: chrono::DateTime<chrono::Utc>,
}

pub type SharedState = Arc<GatewayState>;

impl GatewayState {
    pub fn new(
        pairing: Arc<PairingService>,
        sessions: Arc<SessionRegistry>,
        events: Arc<EventBus>,
    ) -> SharedState {
        Arc::new(Self {
            pairing,
            sessions,
            events,
            start_time: chrono::Utc::now(),
        })
    }

    /// Build every subsystem once from configuration.
    ///
    /// Fails fast when no backend credential is configured.
    pub fn from_config(config: &AppConfig) -> Result<SharedState, ConfigError> {
        let router = lexclaw_providers::router::build_from_config(config)?;
        let provider = router
            .default()
            .ok_or_else(|| ConfigError::MissingCredential {
                provider: config.default_provider.clone(),
            })?;

        let events = Arc::new(EventBus::default());
        let bot = BotConfigHandle::new(config.bot.clone());
        let responder = Arc::new(ResponderClient::from_config(provider, config));
        let sessions = Arc::new(SessionRegistry::from_config(
            config,
            bot,
            responder,
            Arc::clone(&events),
        ));
        let pairing = PairingService::simulated(&config.pairing, Arc::clone(&events));

        Ok(Self::new(pairing, sessions, events))
    }
}

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::exact(HeaderValue::from_static(
            "http://localhost:8080",
        )))
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/health", get(health_handler))
        .merge(api::api_router())
        .with_state(state)
        .layer(DefaultBodyLimit::max(1024 * 1024)) // 1 MB body limit
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Start the gateway HTTP server with the pairing timer running.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let state = GatewayState::from_config(&config)?;
    state.pairing.start().await;

    serve(state, &addr).await
}

/// Bind `addr` and serve the API until the process exits.
pub async fn serve(state: SharedState, addr: &str) -> Result<(), Box<dyn std::error::Error>> {
    let app = build_router(state);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    pairing: PairingStatus,
    conversations: usize,
    uptime_secs: i64,
}

async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        pairing: state.pairing.current_status(),
        conversations: state.sessions.len().await,
        uptime_secs: (chrono::Utc::now() - state.start_time).num_seconds(),
    })
}
