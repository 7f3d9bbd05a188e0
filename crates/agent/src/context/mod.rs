//! Prompt assembly from bot configuration and conversation history.
//!
//! The system prompt carries, in order: assistant identity, tone directive,
//! contact phone, the verbatim system instruction, the verbatim knowledge
//! base and the fixed response-style guidelines. Prior turns replay the
//! history window minus fallback replies.

pub mod assembler;

pub use assembler::{PromptDocument, build_prompt};
