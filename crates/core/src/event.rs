//! Domain event system — decoupled communication between bounded contexts.
//!
//! Events are published when something interesting happens in the system.
//! Other components can subscribe to react without tight coupling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::channel::PairingStatus;
use crate::message::Role;

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// The pairing session moved to a new status
    PairingStatusChanged {
        from: PairingStatus,
        to: PairingStatus,
        timestamp: DateTime<Utc>,
    },

    /// A fresh pairing token was issued
    PairingTokenRotated {
        generation: u64,
        timestamp: DateTime<Utc>,
    },

    /// A message was appended to a conversation
    MessageAppended {
        conversation_id: String,
        message_id: String,
        role: Role,
        is_error: bool,
        timestamp: DateTime<Utc>,
    },

    /// A turn began awaiting the responder
    TurnStarted {
        conversation_id: String,
        timestamp: DateTime<Utc>,
    },

    /// A turn resolved (reply or fallback appended)
    TurnCompleted {
        conversation_id: String,
        failed: bool,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// An error occurred
    ErrorOccurred {
        context: String,
        error_message: String,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for domain events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: DomainEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn event_bus_publish_subscribe() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(DomainEvent::PairingStatusChanged {
            from: PairingStatus::Authenticating,
            to: PairingStatus::Connected,
            timestamp: Utc::now(),
        });

        let event = rx.recv().await.unwrap();
        match event.as_ref() {
            DomainEvent::PairingStatusChanged { from, to, .. } => {
                assert_eq!(*from, PairingStatus::Authenticating);
                assert_eq!(*to, PairingStatus::Connected);
            }
            _ => panic!("Expected PairingStatusChanged event"),
        }
    }

    #[test]
    fn event_bus_no_subscribers_doesnt_panic() {
        let bus = EventBus::new(16);
        bus.publish(DomainEvent::ErrorOccurred {
            context: "test".into(),
            error_message: "no subscribers".into(),
            timestamp: Utc::now(),
        });
    }
}
