//! REST API for the pairing UI and the chat UI.
//!
//! Endpoints:
//!
//! - `GET  /pairing`                        — Pairing status and current token
//! - `POST /pairing/scan`                   — Present the credential (simulate scan)
//! - `POST /pairing/disconnect`             — Tear down the paired session
//! - `GET  /bot`                            — Current bot configuration
//! - `PUT  /bot`                            — Replace the bot configuration
//! - `GET  /conversations`                  — Conversation list with previews
//! - `POST /conversations`                  — Open a conversation
//! - `GET  /conversations/{id}`             — Transcript and view state
//! - `POST /conversations/{id}/messages`    — Send a client message
//! - `POST /conversations/{id}/seen`        — Move the read pointer
//! - `POST /conversations/{id}/viewport`    — Report the near-bottom flag

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use lexclaw_agent::{ConversationSnapshot, ConversationSummary, SessionOrchestrator};
use lexclaw_channels::PairingSnapshot;
use lexclaw_core::bot::BotConfiguration;
use lexclaw_core::conversation::ViewState;
use lexclaw_core::error::{ConversationError, PairingError};
use lexclaw_core::message::{ChatMessage, ConversationId, MessageId};

use crate::SharedState;

/// Build the API router.
pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/pairing", get(get_pairing_handler))
        .route("/pairing/scan", post(scan_handler))
        .route("/pairing/disconnect", post(disconnect_handler))
        .route("/bot", get(get_bot_handler).put(put_bot_handler))
        .route(
            "/conversations",
            get(list_conversations_handler).post(create_conversation_handler),
        )
        .route("/conversations/{id}", get(get_conversation_handler))
        .route("/conversations/{id}/messages", post(send_message_handler))
        .route("/conversations/{id}/seen", post(mark_seen_handler))
        .route("/conversations/{id}/viewport", post(viewport_handler))
}

// ── Request / Response types ──────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

fn conversation_error(e: ConversationError) -> ApiError {
    let status = match &e {
        ConversationError::EmptyMessage => StatusCode::BAD_REQUEST,
        ConversationError::TurnInFlight(_) | ConversationError::DuplicateMessageId(_) => {
            StatusCode::CONFLICT
        }
        ConversationError::UnknownMessage(_) | ConversationError::NotFound(_) => {
            StatusCode::NOT_FOUND
        }
    };
    api_error(status, e.to_string())
}

fn pairing_error(e: PairingError) -> ApiError {
    api_error(StatusCode::CONFLICT, e.to_string())
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub text: String,
    /// Wait for the reply before responding (default: true).
    #[serde(default = "default_wait")]
    pub wait: bool,
}

fn default_wait() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SendMessageResponse {
    pub user_message: ChatMessage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply: Option<ChatMessage>,
}

#[derive(Debug, Deserialize)]
pub struct MarkSeenRequest {
    pub message_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MarkSeenResponse {
    pub unread_count: usize,
}

#[derive(Debug, Deserialize)]
pub struct ViewportRequest {
    pub near_bottom: bool,
}

// ── Pairing ───────────────────────────────────────────────────────────────

async fn get_pairing_handler(State(state): State<SharedState>) -> Json<PairingSnapshot> {
    Json(state.pairing.snapshot().await)
}

/// `POST /pairing/scan`: accepted; verification finishes in the background.
async fn scan_handler(
    State(state): State<SharedState>,
) -> Result<(StatusCode, Json<PairingSnapshot>), ApiError> {
    state
        .pairing
        .present_credential()
        .await
        .map_err(pairing_error)?;
    Ok((StatusCode::ACCEPTED, Json(state.pairing.snapshot().await)))
}

async fn disconnect_handler(
    State(state): State<SharedState>,
) -> Result<Json<PairingSnapshot>, ApiError> {
    state.pairing.disconnect().await.map_err(pairing_error)?;
    Ok(Json(state.pairing.snapshot().await))
}

// ── Bot configuration ─────────────────────────────────────────────────────

async fn get_bot_handler(State(state): State<SharedState>) -> Json<BotConfiguration> {
    Json(state.sessions.bot().snapshot().as_ref().clone())
}

/// `PUT /bot`: whole-object replacement. Turns already in flight keep
/// the configuration they started with.
async fn put_bot_handler(
    State(state): State<SharedState>,
    Json(config): Json<BotConfiguration>,
) -> Json<BotConfiguration> {
    state.sessions.bot().replace(config.clone());
    Json(config)
}

// ── Conversations ─────────────────────────────────────────────────────────

async fn find_conversation(
    state: &SharedState,
    id: &str,
) -> Result<Arc<SessionOrchestrator>, ApiError> {
    state
        .sessions
        .get(&ConversationId::from(id))
        .await
        .ok_or_else(|| conversation_error(ConversationError::NotFound(id.to_string())))
}

async fn list_conversations_handler(
    State(state): State<SharedState>,
) -> Json<Vec<ConversationSummary>> {
    Json(state.sessions.summaries().await)
}

async fn create_conversation_handler(
    State(state): State<SharedState>,
) -> (StatusCode, Json<ConversationSnapshot>) {
    let conversation = state.sessions.open().await;
    (StatusCode::CREATED, Json(conversation.snapshot().await))
}

async fn get_conversation_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<ConversationSnapshot>, ApiError> {
    let conversation = find_conversation(&state, &id).await?;
    Ok(Json(conversation.snapshot().await))
}

/// `POST /conversations/{id}/messages`
///
/// 409 while a previous turn is awaiting its reply, 400 on blank text.
async fn send_message_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(payload): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<SendMessageResponse>), ApiError> {
    let conversation = find_conversation(&state, &id).await?;
    let pending = conversation
        .submit(&payload.text)
        .await
        .map_err(conversation_error)?;
    let user_message = pending.user_message.clone();

    if !payload.wait {
        return Ok((
            StatusCode::ACCEPTED,
            Json(SendMessageResponse {
                user_message,
                reply: None,
            }),
        ));
    }

    let reply = pending
        .reply()
        .await
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok((
        StatusCode::OK,
        Json(SendMessageResponse {
            user_message,
            reply: Some(reply),
        }),
    ))
}

async fn mark_seen_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(payload): Json<MarkSeenRequest>,
) -> Result<Json<MarkSeenResponse>, ApiError> {
    let conversation = find_conversation(&state, &id).await?;
    let unread_count = conversation
        .mark_seen_up_to(&MessageId::from(payload.message_id.as_str()))
        .await
        .map_err(conversation_error)?;
    Ok(Json(MarkSeenResponse { unread_count }))
}

async fn viewport_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(payload): Json<ViewportRequest>,
) -> Result<Json<ViewState>, ApiError> {
    let conversation = find_conversation(&state, &id).await?;
    Ok(Json(conversation.set_near_bottom(payload.near_bottom).await))
}

// ── Tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{GatewayState, build_router};
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use lexclaw_agent::{ResponderClient, SessionRegistry};
    use lexclaw_channels::PairingService;
    use lexclaw_config::PairingConfig;
    use lexclaw_core::bot::BotConfigHandle;
    use lexclaw_core::channel::PairingStatus;
    use lexclaw_core::error::ProviderError;
    use lexclaw_core::event::EventBus;
    use lexclaw_core::message::Role;
    use lexclaw_core::provider::{Provider, ProviderRequest, ProviderResponse};
    use tower::ServiceExt;

    /// Answers every request with the same text, or never answers.
    struct MockProvider {
        reply: Option<String>,
    }

    #[async_trait::async_trait]
    impl Provider for MockProvider {
        fn name(&self) -> &str {
            "mock"
        }

        async fn complete(
            &self,
            _request: ProviderRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            match &self.reply {
                Some(text) => Ok(ProviderResponse {
                    text: Some(text.clone()),
                    usage: None,
                    model: "mock-model".into(),
                }),
                None => std::future::pending().await,
            }
        }
    }

    fn state_with(reply: Option<&str>) -> SharedState {
        let events = Arc::new(EventBus::default());
        let provider = Arc::new(MockProvider {
            reply: reply.map(String::from),
        });
        let responder = Arc::new(ResponderClient::new(provider, "mock-model"));
        let sessions = Arc::new(SessionRegistry::new(
            BotConfigHandle::default(),
            responder,
            Arc::clone(&events),
            Some(40),
        ));
        let pairing = PairingService::simulated(&PairingConfig::default(), Arc::clone(&events));
        GatewayState::new(pairing, sessions, events)
    }

    pub(crate) fn test_state() -> SharedState {
        state_with(Some("Mock response from assistant"))
    }

    async fn call(
        state: &SharedState,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let builder = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(json) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = build_router(state.clone()).oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn open(state: &SharedState) -> String {
        let (status, json) = call(state, "POST", "/conversations", None).await;
        assert_eq!(status, StatusCode::CREATED);
        json["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn pairing_scan_then_disconnect() {
        let state = test_state();

        let (status, json) = call(&state, "GET", "/pairing", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "awaiting_scan");
        assert_eq!(json["validity_ticks"], 15);
        assert!(json["token"].is_string());

        let (status, json) = call(&state, "POST", "/pairing/scan", None).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(json["status"], "authenticating");

        let (status, _) = call(&state, "POST", "/pairing/scan", None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, json) = call(&state, "POST", "/pairing/disconnect", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "awaiting_scan");
        assert_eq!(state.pairing.current_status(), PairingStatus::AwaitingScan);
    }

    #[tokio::test]
    async fn disconnect_while_unpaired_conflicts() {
        let state = test_state();
        let (status, json) = call(&state, "POST", "/pairing/disconnect", None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(json["error"].as_str().unwrap().contains("disconnect"));
    }

    #[tokio::test]
    async fn bot_config_roundtrip() {
        let state = test_state();

        let (status, mut json) = call(&state, "GET", "/bot", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["company_name"], "Adam Advocacia");

        json["assistant_name"] = "Dra. Ana".into();
        json["tone"] = "amigavel".into();
        let (status, json) = call(&state, "PUT", "/bot", Some(json)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["tone"], "friendly");

        let (_, json) = call(&state, "GET", "/bot", None).await;
        assert_eq!(json["assistant_name"], "Dra. Ana");
    }

    #[tokio::test]
    async fn bot_config_rejects_unknown_tone() {
        let state = test_state();
        let (_, mut json) = call(&state, "GET", "/bot", None).await;
        json["tone"] = "sarcastic".into();

        let (status, _) = call(&state, "PUT", "/bot", Some(json)).await;
        assert!(status.is_client_error());

        let (_, json) = call(&state, "GET", "/bot", None).await;
        assert_eq!(json["tone"], "formal");
    }

    #[tokio::test]
    async fn conversation_turn_over_http() {
        let state = test_state();
        let id = open(&state).await;

        let (status, json) = call(
            &state,
            "POST",
            &format!("/conversations/{id}/messages"),
            Some(serde_json::json!({ "text": "Recebi uma multa" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let resp: SendMessageResponse = serde_json::from_value(json).unwrap();
        assert_eq!(resp.user_message.role, Role::User);
        assert_eq!(resp.reply.unwrap().text, "Mock response from assistant");

        let (status, json) = call(&state, "GET", &format!("/conversations/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["messages"].as_array().unwrap().len(), 3);
        assert_eq!(json["phase"], "idle");
        assert_eq!(json["view"]["unread_count"], 0);
    }

    #[tokio::test]
    async fn conversation_list_shows_previews() {
        let state = test_state();
        let (status, json) = call(&state, "GET", "/conversations", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(json.as_array().unwrap().is_empty());

        let quiet = open(&state).await;
        let active = open(&state).await;
        call(
            &state,
            "POST",
            &format!("/conversations/{active}/messages"),
            Some(serde_json::json!({ "text": "Recebi uma multa" })),
        )
        .await;

        let (_, json) = call(&state, "GET", "/conversations", None).await;
        let rows = json.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["id"], active.as_str());
        assert_eq!(rows[0]["preview"], "Mock response from assistant");
        assert_eq!(rows[0]["unread_count"], 0);
        assert_eq!(rows[0]["phase"], "idle");
        assert_eq!(rows[1]["id"], quiet.as_str());
        assert!(rows[1]["preview"].as_str().unwrap().ends_with("..."));
    }

    #[tokio::test]
    async fn blank_message_is_bad_request() {
        let state = test_state();
        let id = open(&state).await;

        let (status, _) = call(
            &state,
            "POST",
            &format!("/conversations/{id}/messages"),
            Some(serde_json::json!({ "text": "   " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn second_send_while_pending_conflicts() {
        let state = state_with(None);
        let id = open(&state).await;
        let uri = format!("/conversations/{id}/messages");

        let (status, json) = call(
            &state,
            "POST",
            &uri,
            Some(serde_json::json!({ "text": "um", "wait": false })),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert!(json.get("reply").is_none());

        let (status, _) = call(
            &state,
            "POST",
            &uri,
            Some(serde_json::json!({ "text": "dois", "wait": false })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (_, json) = call(&state, "GET", &format!("/conversations/{id}"), None).await;
        assert_eq!(json["phase"], "awaiting_response");
        assert_eq!(json["view"]["typing"], true);
    }

    #[tokio::test]
    async fn seen_and_viewport_update_unread() {
        let state = test_state();
        let id = open(&state).await;

        let (status, json) = call(
            &state,
            "POST",
            &format!("/conversations/{id}/viewport"),
            Some(serde_json::json!({ "near_bottom": false })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["show_jump_to_latest"], true);

        let (_, json) = call(&state, "GET", &format!("/conversations/{id}"), None).await;
        let greeting_id = json["messages"][0]["id"].as_str().unwrap().to_string();

        let (status, json) = call(
            &state,
            "POST",
            &format!("/conversations/{id}/seen"),
            Some(serde_json::json!({ "message_id": greeting_id })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["unread_count"], 0);

        let (status, _) = call(
            &state,
            "POST",
            &format!("/conversations/{id}/seen"),
            Some(serde_json::json!({ "message_id": "nope" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_conversation_is_not_found() {
        let state = test_state();
        let (status, json) = call(&state, "GET", "/conversations/missing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(json["error"].as_str().unwrap().contains("missing"));
    }
}
