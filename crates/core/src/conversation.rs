//! Per-conversation message log with read-position bookkeeping.
//!
//! [`ConversationState`] is an append-only, ordered log. Alongside the
//! messages it tracks a read pointer and a caller-supplied "near bottom"
//! viewport flag, from which the unread count is derived:
//!
//! - `unread_count` = number of Model messages appended after the read pointer
//! - a Model message appended while near the bottom is seen immediately
//! - a Model message appended while scrolled up stays unread
//!
//! All operations are synchronous. Callers sharing a conversation between
//! tasks serialize access (one mutex per conversation).

use crate::error::ConversationError;
use crate::message::{ChatMessage, ConversationId, MessageId, Role};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Derived view state for rendering a transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewState {
    pub unread_count: usize,
    pub near_bottom: bool,
    /// Show the "jump to latest" affordance.
    pub show_jump_to_latest: bool,
    /// A responder call is outstanding.
    pub typing: bool,
}

/// An ordered conversation log.
#[derive(Debug, Clone)]
pub struct ConversationState {
    id: ConversationId,
    messages: Vec<ChatMessage>,
    positions: HashMap<MessageId, usize>,
    /// Index of the last message the viewer has seen.
    read_pointer: Option<usize>,
    near_bottom: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ConversationState {
    /// Create an empty conversation. The viewer starts at the bottom.
    pub fn new(id: ConversationId) -> Self {
        let now = Utc::now();
        Self {
            id,
            messages: Vec::new(),
            positions: HashMap::new(),
            read_pointer: None,
            near_bottom: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> &ConversationId {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Append a message to the end of the log.
    ///
    /// Fails if a message with the same id is already present; the log is
    /// left untouched in that case.
    pub fn append(&mut self, message: ChatMessage) -> Result<(), ConversationError> {
        if self.positions.contains_key(&message.id) {
            return Err(ConversationError::DuplicateMessageId(message.id.0));
        }

        let index = self.messages.len();
        let seen_now = message.role == Role::Model && self.near_bottom;
        self.positions.insert(message.id.clone(), index);
        self.messages.push(message);
        self.updated_at = Utc::now();

        if seen_now {
            self.read_pointer = Some(index);
        }
        Ok(())
    }

    /// The most recent `limit` messages (all when `None`), in insertion order.
    pub fn history(&self, limit: Option<usize>) -> &[ChatMessage] {
        match limit {
            Some(n) if n < self.messages.len() => &self.messages[self.messages.len() - n..],
            _ => &self.messages,
        }
    }

    /// All messages in insertion order.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn get(&self, id: &MessageId) -> Option<&ChatMessage> {
        self.positions.get(id).map(|&i| &self.messages[i])
    }

    pub fn last_message(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Move the read pointer to `id` and return the resulting unread count.
    ///
    /// The pointer is set exactly, so marking an earlier message makes the
    /// Model messages after it unread again.
    pub fn mark_seen_up_to(&mut self, id: &MessageId) -> Result<usize, ConversationError> {
        let index = *self
            .positions
            .get(id)
            .ok_or_else(|| ConversationError::UnknownMessage(id.0.clone()))?;
        self.read_pointer = Some(index);
        Ok(self.unread_count())
    }

    /// Number of Model messages after the read pointer.
    pub fn unread_count(&self) -> usize {
        let start = self.read_pointer.map_or(0, |i| i + 1);
        self.messages[start..]
            .iter()
            .filter(|m| m.role == Role::Model)
            .count()
    }

    /// The last message the viewer has seen, if any.
    pub fn last_seen(&self) -> Option<&MessageId> {
        self.read_pointer.map(|i| &self.messages[i].id)
    }

    pub fn near_bottom(&self) -> bool {
        self.near_bottom
    }

    /// Record the viewer's viewport position.
    ///
    /// Arriving at the bottom marks everything seen.
    pub fn set_near_bottom(&mut self, near_bottom: bool) {
        self.near_bottom = near_bottom;
        if near_bottom {
            self.mark_all_seen();
        }
    }

    /// Jump to the latest message: near bottom, nothing unread.
    pub fn scroll_to_bottom(&mut self) {
        self.set_near_bottom(true);
    }

    fn mark_all_seen(&mut self) {
        if !self.messages.is_empty() {
            self.read_pointer = Some(self.messages.len() - 1);
        }
    }

    pub fn view_state(&self, typing: bool) -> ViewState {
        ViewState {
            unread_count: self.unread_count(),
            near_bottom: self.near_bottom,
            show_jump_to_latest: !self.near_bottom,
            typing,
        }
    }
}
