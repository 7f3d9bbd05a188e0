//! Channel trait — the abstraction over the messaging transport.
//!
//! A Channel connects LexClaw to a messaging platform. Transports that
//! require device pairing (WhatsApp-style) only carry traffic while their
//! pairing session is [`PairingStatus::Connected`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::ChannelError;

/// Unique identifier for a channel instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(pub String);

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a device-pairing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairingStatus {
    /// Showing a rotating pairing token, waiting for a device to scan it
    AwaitingScan,
    /// A credential was presented and is being verified
    Authenticating,
    /// Paired; the transport carries traffic
    Connected,
    /// Torn down; immediately re-enters `AwaitingScan`
    Disconnected,
}

impl PairingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PairingStatus::AwaitingScan => "awaiting_scan",
            PairingStatus::Authenticating => "authenticating",
            PairingStatus::Connected => "connected",
            PairingStatus::Disconnected => "disconnected",
        }
    }
}

impl std::fmt::Display for PairingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message received from or sent to a channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelMessage {
    /// The channel this message belongs to
    pub channel_id: ChannelId,

    /// Sender identifier (platform-specific user ID, e.g. a phone number)
    pub sender_id: String,

    /// Human-readable sender name (if available)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_name: Option<String>,

    /// The text content
    pub content: String,

    /// The chat identifier within the channel; one conversation per chat
    pub chat_id: String,

    /// Platform-specific metadata
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// The core Channel trait.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Human-readable channel name (e.g., "whatsapp").
    fn name(&self) -> &str;

    /// Unique ID for this channel instance.
    fn id(&self) -> &ChannelId;

    /// Start listening for incoming messages.
    async fn start(
        &self,
    ) -> std::result::Result<
        tokio::sync::mpsc::Receiver<std::result::Result<ChannelMessage, ChannelError>>,
        ChannelError,
    >;

    /// Send a response message to a specific chat.
    async fn send(&self, chat_id: &str, content: &str) -> std::result::Result<(), ChannelError>;

    /// Send a typing indicator (if the platform supports it).
    async fn send_typing(&self, _chat_id: &str) -> std::result::Result<(), ChannelError> {
        Ok(()) // No-op default
    }

    /// Stop the channel gracefully.
    async fn stop(&self) -> std::result::Result<(), ChannelError> {
        Ok(())
    }

    /// Health check — is the channel connected and operational?
    async fn health_check(&self) -> std::result::Result<bool, ChannelError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_message_creation() {
        let msg = ChannelMessage {
            channel_id: ChannelId("whatsapp".into()),
            sender_id: "5511999999999".into(),
            sender_name: Some("João Silva".into()),
            content: "Recebi uma multa da PRF".into(),
            chat_id: "5511999999999".into(),
            metadata: serde_json::Map::new(),
        };
        assert_eq!(msg.channel_id.0, "whatsapp");
        assert_eq!(msg.content, "Recebi uma multa da PRF");
    }

    #[test]
    fn pairing_status_serialization() {
        let json = serde_json::to_string(&PairingStatus::AwaitingScan).unwrap();
        assert_eq!(json, "\"awaiting_scan\"");
        assert_eq!(PairingStatus::Connected.to_string(), "connected");
    }
}
