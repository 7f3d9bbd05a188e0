//! Prompt assembly — renders bot configuration and conversation history into
//! the request handed to the LLM backend.
//!
//! # Determinism
//!
//! Assembly is a pure function of its inputs: no clock, no randomness, no
//! I/O. Identical inputs always produce a byte-identical prompt.

use lexclaw_core::bot::BotConfiguration;
use lexclaw_core::message::ChatMessage;
use lexclaw_core::provider::{ProviderRequest, Turn};
use serde::{Deserialize, Serialize};

/// Fixed response-style directives appended to every system prompt.
const GUIDELINES: &str = "\
DIRETRIZES:
1. Responda de forma concisa em chats.
2. Se não souber a resposta, peça para o cliente aguardar o atendimento humano.
3. Formate a resposta de maneira legível para WhatsApp (use quebras de linha).";

/// The rendered prompt: system text plus the prior turns to replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptDocument {
    pub system_prompt: String,
    pub prior_turns: Vec<Turn>,
}

impl PromptDocument {
    /// Combine with the new client message into a backend request.
    pub fn into_request(
        self,
        model: impl Into<String>,
        new_message: impl Into<String>,
        temperature: f32,
    ) -> ProviderRequest {
        ProviderRequest {
            model: model.into(),
            system_prompt: self.system_prompt,
            prior_turns: self.prior_turns,
            new_message: new_message.into(),
            temperature,
        }
    }
}

/// Render `config` and `history` into a prompt.
///
/// Messages flagged `is_error` are fallback replies, not genuine assistant
/// output, and are never replayed as prior turns. Order is preserved.
pub fn build_prompt(config: &BotConfiguration, history: &[ChatMessage]) -> PromptDocument {
    PromptDocument {
        system_prompt: render_system_prompt(config),
        prior_turns: history
            .iter()
            .filter(|m| !m.is_error)
            .map(|m| Turn {
                role: m.role,
                text: m.text.clone(),
            })
            .collect(),
    }
}

fn render_system_prompt(config: &BotConfiguration) -> String {
    format!(
        "ATUAÇÃO: {assistant}, Assistente da {company}.\n\
         TOM DE VOZ: {tone}.\n\
         TELEFONE DE CONTATO: {phone}.\n\
         \n\
         INSTRUÇÕES DO SISTEMA:\n\
         {instruction}\n\
         \n\
         BASE DE CONHECIMENTO RÁPIDO:\n\
         {knowledge}\n\
         \n\
         {guidelines}\n",
        assistant = config.assistant_name,
        company = config.company_name,
        tone = config.tone.prompt_label(),
        phone = config.contact_phone,
        instruction = config.system_instruction,
        knowledge = config.knowledge_base,
        guidelines = GUIDELINES,
    )
}
