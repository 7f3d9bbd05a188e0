//! The conversation engine of LexClaw.
//!
//! For each inbound client message the orchestrator:
//!
//! 1. **Appends** the user message to the conversation log
//! 2. **Builds the prompt** from the bot configuration snapshot and history
//! 3. **Calls the responder** (one backend call, bounded by a timeout)
//! 4. **Appends** the reply, or a flagged fallback when the call failed
//!
//! Only one turn per conversation is in flight at a time.

pub mod context;
pub mod orchestrator;
pub mod responder;
pub mod sessions;

#[cfg(test)]
mod test_helpers;

pub use context::{PromptDocument, build_prompt};
pub use orchestrator::{
    ConversationSnapshot, ConversationSummary, PendingTurn, SessionOrchestrator, TurnPhase,
};
pub use responder::ResponderClient;
pub use sessions::SessionRegistry;
