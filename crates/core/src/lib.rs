//! # LexClaw Core
//!
//! Domain types, traits, and error definitions for the LexClaw legal-intake
//! assistant. This crate has **no I/O** — it defines the domain model that
//! all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every subsystem boundary is a trait here (`Provider`, `Channel`).
//! Implementations live in their respective crates. This enables:
//! - Swapping LLM backends via configuration
//! - Easy testing with scripted/failing mock implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod message;
pub mod bot;
pub mod conversation;
pub mod provider;
pub mod channel;
pub mod event;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use message::{ChatMessage, ConversationId, MessageId, Role};
pub use bot::{BotConfigHandle, BotConfiguration, Tone};
pub use conversation::{ConversationState, ViewState};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Turn};
pub use channel::{Channel, ChannelId, ChannelMessage, PairingStatus};
pub use event::{DomainEvent, EventBus};
