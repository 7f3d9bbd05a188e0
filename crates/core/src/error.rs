//! Error types for the LexClaw domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use crate::channel::PairingStatus;
use thiserror::Error;

/// The top-level error type for all LexClaw operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Responder errors ---
    #[error("Responder error: {0}")]
    Responder(#[from] ResponderError),

    // --- Conversation errors ---
    #[error("Conversation error: {0}")]
    Conversation(#[from] ConversationError),

    // --- Pairing errors ---
    #[error("Pairing error: {0}")]
    Pairing(#[from] PairingError),

    // --- Channel errors ---
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// A failed responder call. Always recovered locally by substituting the
/// fallback reply; never written to the transcript as-is.
#[derive(Debug, Clone, Error)]
pub enum ResponderError {
    #[error("Backend failure: {0}")]
    Backend(#[from] ProviderError),

    #[error("No reply from backend after {after_secs}s")]
    Timeout { after_secs: u64 },
}

/// Validation failures of the conversation log and turn protocol.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversationError {
    #[error("Message id already present in conversation: {0}")]
    DuplicateMessageId(String),

    #[error("Unknown message id: {0}")]
    UnknownMessage(String),

    #[error("Message text is empty")]
    EmptyMessage,

    #[error("A turn is already awaiting a response in conversation {0}")]
    TurnInFlight(String),

    #[error("Conversation not found: {0}")]
    NotFound(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PairingError {
    #[error("Cannot {action} while {from}")]
    InvalidTransition {
        from: PairingStatus,
        action: &'static str,
    },

    #[error("Authentication attempt {0} is no longer current")]
    StaleAttempt(u64),
}

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Transport is not paired (status: {0})")]
    NotPaired(PairingStatus),

    #[error("Message delivery failed to {channel}: {reason}")]
    DeliveryFailed { channel: String, reason: String },

    #[error("Channel connection lost: {0}")]
    ConnectionLost(String),
}
