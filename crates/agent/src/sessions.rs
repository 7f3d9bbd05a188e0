//! Session registry — one orchestrator per conversation id.

use std::collections::HashMap;
use std::sync::Arc;

use lexclaw_config::AppConfig;
use lexclaw_core::bot::BotConfigHandle;
use lexclaw_core::event::EventBus;
use lexclaw_core::message::ConversationId;
use tokio::sync::RwLock;

use crate::orchestrator::{ConversationSummary, SessionOrchestrator};
use crate::responder::ResponderClient;

/// Owns every open conversation and the collaborators they share.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<ConversationId, Arc<SessionOrchestrator>>>,
    bot: BotConfigHandle,
    responder: Arc<ResponderClient>,
    events: Arc<EventBus>,
    history_limit: Option<usize>,
}

impl SessionRegistry {
    pub fn new(
        bot: BotConfigHandle,
        responder: Arc<ResponderClient>,
        events: Arc<EventBus>,
        history_limit: Option<usize>,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            bot,
            responder,
            events,
            history_limit,
        }
    }

    pub fn from_config(
        config: &AppConfig,
        bot: BotConfigHandle,
        responder: Arc<ResponderClient>,
        events: Arc<EventBus>,
    ) -> Self {
        Self::new(bot, responder, events, config.conversation.history_window())
    }

    pub fn bot(&self) -> &BotConfigHandle {
        &self.bot
    }

    /// Open a new conversation with a generated id.
    pub async fn open(&self) -> Arc<SessionOrchestrator> {
        self.get_or_open(ConversationId::new()).await
    }

    /// Return the conversation for `id`, opening it on first use.
    pub async fn get_or_open(&self, id: ConversationId) -> Arc<SessionOrchestrator> {
        if let Some(existing) = self.get(&id).await {
            return existing;
        }

        let mut sessions = self.sessions.write().await;
        Arc::clone(sessions.entry(id.clone()).or_insert_with(|| {
            Arc::new(SessionOrchestrator::open(
                id,
                self.bot.clone(),
                Arc::clone(&self.responder),
                Arc::clone(&self.events),
                self.history_limit,
            ))
        }))
    }

    pub async fn get(&self, id: &ConversationId) -> Option<Arc<SessionOrchestrator>> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Summaries of all open conversations, most recently active first.
    pub async fn summaries(&self) -> Vec<ConversationSummary> {
        let open: Vec<_> = self.sessions.read().await.values().cloned().collect();

        let mut summaries = Vec::with_capacity(open.len());
        for conversation in open {
            summaries.push(conversation.summary().await);
        }
        summaries.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| a.id.0.cmp(&b.id.0))
        });
        summaries
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
