//! Session orchestrator — runs one conversation's turns.
//!
//! A turn moves `Idle → Sending → AwaitingResponse → Idle`:
//!
//! 1. **Sending**: the user message is appended and the sender's view jumps
//!    to the bottom. The bot configuration and the prompt history are
//!    captured here, before the backend is called.
//! 2. **AwaitingResponse**: exactly one responder call is outstanding
//!    (typing indicator on). A second send is rejected with `TurnInFlight`.
//! 3. **Idle**: the reply, or the failure fallback flagged `is_error`, is
//!    appended. Its unread effect uses the viewport state at arrival time.
//!
//! The responder call runs in its own task, so dropping the caller's future
//! does not cancel the turn; the reply is still appended when it arrives.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use lexclaw_core::bot::{BotConfigHandle, BotConfiguration};
use lexclaw_core::conversation::{ConversationState, ViewState};
use lexclaw_core::error::{ConversationError, Error};
use lexclaw_core::event::{DomainEvent, EventBus};
use lexclaw_core::message::{ChatMessage, ConversationId, MessageId};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::context::build_prompt;
use crate::responder::ResponderClient;

/// Where the conversation's current turn stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPhase {
    Idle,
    Sending,
    AwaitingResponse,
}

/// Everything a transcript view needs.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationSnapshot {
    pub id: ConversationId,
    pub messages: Vec<ChatMessage>,
    pub phase: TurnPhase,
    pub last_seen: Option<MessageId>,
    pub view: ViewState,
}

/// Characters of the last message shown in a conversation list row.
pub const PREVIEW_CHARS: usize = 40;

/// One row of the conversation list.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationSummary {
    pub id: ConversationId,
    pub preview: String,
    pub unread_count: usize,
    pub phase: TurnPhase,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

struct Inner {
    store: ConversationState,
    phase: TurnPhase,
}

/// A submitted turn whose reply is still being produced.
pub struct PendingTurn {
    pub user_message: ChatMessage,
    handle: JoinHandle<ChatMessage>,
}

impl PendingTurn {
    /// Wait for the reply (or fallback) to be appended.
    pub async fn reply(self) -> Result<ChatMessage, Error> {
        self.handle
            .await
            .map_err(|e| Error::Internal(format!("Turn task failed: {e}")))
    }
}

pub struct SessionOrchestrator {
    id: ConversationId,
    inner: Arc<Mutex<Inner>>,
    bot: BotConfigHandle,
    responder: Arc<ResponderClient>,
    events: Arc<EventBus>,
    history_limit: Option<usize>,
}

impl SessionOrchestrator {
    /// Open a conversation, seeded with the assistant's greeting.
    pub fn open(
        id: ConversationId,
        bot: BotConfigHandle,
        responder: Arc<ResponderClient>,
        events: Arc<EventBus>,
        history_limit: Option<usize>,
    ) -> Self {
        let mut store = ConversationState::new(id.clone());
        let greeting = ChatMessage::model(bot.snapshot().greeting());
        // Fresh store and fresh id; cannot collide.
        let _ = store.append(greeting.clone());

        info!(conversation_id = %id, "Conversation opened");
        publish_appended(&events, &id, &greeting);

        Self {
            id,
            inner: Arc::new(Mutex::new(Inner {
                store,
                phase: TurnPhase::Idle,
            })),
            bot,
            responder,
            events,
            history_limit,
        }
    }

    pub fn id(&self) -> &ConversationId {
        &self.id
    }

    /// Append the user message and start the responder call.
    ///
    /// Returns once the user message is in the log; the reply arrives
    /// through the returned `PendingTurn`.
    pub async fn submit(&self, text: &str) -> Result<PendingTurn, ConversationError> {
        if text.trim().is_empty() {
            return Err(ConversationError::EmptyMessage);
        }

        let (user_message, history, config) = {
            let mut inner = self.inner.lock().await;
            if inner.phase != TurnPhase::Idle {
                debug!(conversation_id = %self.id, phase = ?inner.phase, "Send rejected");
                return Err(ConversationError::TurnInFlight(self.id.to_string()));
            }
            inner.phase = TurnPhase::Sending;

            let config: Arc<BotConfiguration> = self.bot.snapshot();
            let history = inner.store.history(self.history_limit).to_vec();
            let user_message = ChatMessage::user(text);

            if let Err(e) = append_checked(&mut inner.store, user_message.clone()) {
                inner.phase = TurnPhase::Idle;
                return Err(e);
            }
            inner.store.scroll_to_bottom();
            inner.phase = TurnPhase::AwaitingResponse;

            publish_appended(&self.events, &self.id, &user_message);
            self.events.publish(DomainEvent::TurnStarted {
                conversation_id: self.id.to_string(),
                timestamp: Utc::now(),
            });

            (user_message, history, config)
        };

        let id = self.id.clone();
        let inner = Arc::clone(&self.inner);
        let responder = Arc::clone(&self.responder);
        let events = Arc::clone(&self.events);
        let new_text = user_message.text.clone();

        let handle = tokio::spawn(async move {
            let start = Instant::now();
            let prompt = build_prompt(&config, &history);

            // The backend call runs in its own task so a panicking provider
            // resolves the turn with the fallback instead of leaving it stuck.
            let call = {
                let responder = Arc::clone(&responder);
                tokio::spawn(async move { responder.complete(&prompt, &new_text).await })
            };

            let outcome = match call.await {
                Ok(Ok(text)) => Ok(ChatMessage::model(text)),
                Ok(Err(e)) => Err(e.to_string()),
                Err(e) => Err(format!("responder task failed: {e}")),
            };
            let reply = outcome.unwrap_or_else(|reason| {
                warn!(conversation_id = %id, error = %reason, "Substituting failure reply");
                events.publish(DomainEvent::ErrorOccurred {
                    context: format!("responder:{id}"),
                    error_message: reason,
                    timestamp: Utc::now(),
                });
                ChatMessage::model_error(responder.failure_reply())
            });

            let duration_ms = start.elapsed().as_millis() as u64;
            {
                let mut inner = inner.lock().await;
                // A fresh v7 id never collides; a failure here is logged loudly.
                let _ = append_checked(&mut inner.store, reply.clone());

                publish_appended(&events, &id, &reply);
                events.publish(DomainEvent::TurnCompleted {
                    conversation_id: id.to_string(),
                    failed: reply.is_error,
                    duration_ms,
                    timestamp: Utc::now(),
                });
                inner.phase = TurnPhase::Idle;
            }

            info!(
                conversation_id = %id,
                failed = reply.is_error,
                duration_ms,
                "Turn completed"
            );

            reply
        });

        Ok(PendingTurn {
            user_message,
            handle,
        })
    }

    /// Submit and wait for the reply.
    pub async fn send(&self, text: &str) -> Result<ChatMessage, Error> {
        let pending = self.submit(text).await?;
        pending.reply().await
    }

    pub async fn phase(&self) -> TurnPhase {
        self.inner.lock().await.phase
    }

    pub async fn messages(&self) -> Vec<ChatMessage> {
        self.inner.lock().await.store.messages().to_vec()
    }

    pub async fn history(&self, limit: Option<usize>) -> Vec<ChatMessage> {
        self.inner.lock().await.store.history(limit).to_vec()
    }

    pub async fn mark_seen_up_to(&self, id: &MessageId) -> Result<usize, ConversationError> {
        self.inner.lock().await.store.mark_seen_up_to(id)
    }

    pub async fn set_near_bottom(&self, near_bottom: bool) -> ViewState {
        let mut inner = self.inner.lock().await;
        inner.store.set_near_bottom(near_bottom);
        view_of(&inner)
    }

    pub async fn scroll_to_bottom(&self) -> ViewState {
        let mut inner = self.inner.lock().await;
        inner.store.scroll_to_bottom();
        view_of(&inner)
    }

    pub async fn view_state(&self) -> ViewState {
        view_of(&*self.inner.lock().await)
    }

    pub async fn snapshot(&self) -> ConversationSnapshot {
        let inner = self.inner.lock().await;
        ConversationSnapshot {
            id: self.id.clone(),
            messages: inner.store.messages().to_vec(),
            phase: inner.phase,
            last_seen: inner.store.last_seen().cloned(),
            view: view_of(&inner),
        }
    }

    pub async fn summary(&self) -> ConversationSummary {
        let inner = self.inner.lock().await;
        ConversationSummary {
            id: self.id.clone(),
            preview: inner
                .store
                .messages()
                .last()
                .map(|m| m.preview(PREVIEW_CHARS))
                .unwrap_or_default(),
            unread_count: view_of(&inner).unread_count,
            phase: inner.phase,
            created_at: inner.store.created_at(),
            updated_at: inner.store.updated_at(),
        }
    }
}

fn view_of(inner: &Inner) -> ViewState {
    inner
        .store
        .view_state(inner.phase == TurnPhase::AwaitingResponse)
}

fn append_checked(
    store: &mut ConversationState,
    message: ChatMessage,
) -> Result<(), ConversationError> {
    let result = store.append(message);
    if let Err(e) = &result {
        error!(conversation_id = %store.id(), error = %e, "Rejected append");
    }
    debug_assert!(result.is_ok(), "duplicate message id in {}", store.id());
    result
}

fn publish_appended(events: &EventBus, id: &ConversationId, message: &ChatMessage) {
    events.publish(DomainEvent::MessageAppended {
        conversation_id: id.to_string(),
        message_id: message.id.to_string(),
        role: message.role,
        is_error: message.is_error,
        timestamp: message.timestamp,
    });
}
