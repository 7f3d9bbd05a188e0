//! Bot configuration — the assistant's identity, tone and knowledge.
//!
//! The administrative editor replaces the whole [`BotConfiguration`] at
//! once through a [`BotConfigHandle`]. Readers take an `Arc` snapshot at the
//! start of a turn and use it for the whole request/response cycle, so a
//! concurrent edit never changes a prompt that is already in flight.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;

/// Voice the assistant answers in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    Formal,
    #[serde(alias = "amigavel")]
    Friendly,
    #[serde(alias = "assertivo")]
    Assertive,
}

impl Tone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Formal => "formal",
            Tone::Friendly => "friendly",
            Tone::Assertive => "assertive",
        }
    }

    /// The pt-BR label written into the system prompt.
    pub fn prompt_label(&self) -> &'static str {
        match self {
            Tone::Formal => "formal",
            Tone::Friendly => "amigavel",
            Tone::Assertive => "assertivo",
        }
    }
}

impl std::fmt::Display for Tone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Tone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "formal" => Ok(Tone::Formal),
            "friendly" | "amigavel" => Ok(Tone::Friendly),
            "assertive" | "assertivo" => Ok(Tone::Assertive),
            other => Err(format!("unknown tone '{other}' (expected formal, friendly or assertive)")),
        }
    }
}

/// Assistant identity and knowledge. Every field is always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotConfiguration {
    pub company_name: String,
    pub assistant_name: String,
    pub tone: Tone,
    pub contact_phone: String,
    pub system_instruction: String,
    pub knowledge_base: String,
}

impl BotConfiguration {
    /// The opening message a new conversation starts with.
    pub fn greeting(&self) -> String {
        format!(
            "Olá! Sou o {} da {}. Como posso ajudar com seu caso de trânsito hoje?",
            self.assistant_name, self.company_name
        )
    }
}

impl Default for BotConfiguration {
    fn default() -> Self {
        Self {
            company_name: "Adam Advocacia".into(),
            assistant_name: "Dr. Virtual".into(),
            tone: Tone::Formal,
            contact_phone: "(11) 99999-9999".into(),
            system_instruction: concat!(
                "Você é um assistente virtual jurídico da Adam Advocacia, especializado em Direito de Trânsito e Defesa de Condutores.\n",
                "Seu objetivo é realizar uma triagem inicial dos clientes, entender o problema (multa, suspensão de CNH, lei seca, etc.) e coletar informações básicas.\n",
                "NÃO forneça pareceres jurídicos definitivos ou garantia de causa ganha.\n",
                "Sempre que o usuário mencionar um caso complexo, oriente-o a agendar uma consulta com um advogado humano.\n",
                "Mantenha um tom profissional, empático e seguro.\n",
                "Use a legislação brasileira (CTB - Código de Trânsito Brasileiro) como base.",
            )
            .into(),
            knowledge_base: concat!(
                "- Recurso de Multas: Defesa prévia, JARI e CETRAN.\n",
                "- Lei Seca: Recusa ao bafômetro gera multa gravíssima e suspensão de 12 meses.\n",
                "- Suspensão da CNH: Ocorre por pontuação (20, 30 ou 40 pontos) ou infrações mandatórias.\n",
                "- Cassação da CNH: Ocorre quando dirige suspenso ou reincidência em certas multas.",
            )
            .into(),
        }
    }
}

/// Shared, replaceable bot configuration.
///
/// Cloning the handle shares the same underlying value.
#[derive(Debug, Clone)]
pub struct BotConfigHandle {
    tx: Arc<watch::Sender<Arc<BotConfiguration>>>,
}

impl BotConfigHandle {
    pub fn new(config: BotConfiguration) -> Self {
        let (tx, _) = watch::channel(Arc::new(config));
        Self { tx: Arc::new(tx) }
    }

    /// A consistent snapshot for one request/response cycle.
    pub fn snapshot(&self) -> Arc<BotConfiguration> {
        self.tx.borrow().clone()
    }

    /// Replace the configuration wholesale (administrative edit).
    pub fn replace(&self, config: BotConfiguration) {
        tracing::info!(
            company = %config.company_name,
            assistant = %config.assistant_name,
            tone = %config.tone,
            "Bot configuration replaced"
        );
        self.tx.send_replace(Arc::new(config));
    }
}

impl Default for BotConfigHandle {
    fn default() -> Self {
        Self::new(BotConfiguration::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_persona() {
        let config = BotConfiguration::default();
        assert_eq!(config.company_name, "Adam Advocacia");
        assert_eq!(config.assistant_name, "Dr. Virtual");
        assert_eq!(config.tone, Tone::Formal);
        assert!(config.knowledge_base.contains("JARI"));
    }

    #[test]
    fn greeting_uses_identity() {
        let greeting = BotConfiguration::default().greeting();
        assert!(greeting.starts_with("Olá! Sou o Dr. Virtual da Adam Advocacia."));
    }

    #[test]
    fn tone_accepts_portuguese_aliases() {
        let tone: Tone = serde_json::from_str("\"amigavel\"").unwrap();
        assert_eq!(tone, Tone::Friendly);
        assert_eq!("assertivo".parse::<Tone>().unwrap(), Tone::Assertive);
        assert!("sarcastic".parse::<Tone>().is_err());
        assert!(serde_json::from_str::<Tone>("\"sarcastic\"").is_err());
    }

    #[test]
    fn snapshot_survives_replace() {
        let handle = BotConfigHandle::default();
        let before = handle.snapshot();

        handle.replace(BotConfiguration {
            company_name: "Outra Advocacia".into(),
            ..BotConfiguration::default()
        });

        assert_eq!(before.company_name, "Adam Advocacia");
        assert_eq!(handle.snapshot().company_name, "Outra Advocacia");
    }

    #[test]
    fn cloned_handles_share_state() {
        let handle = BotConfigHandle::default();
        let other = handle.clone();
        other.replace(BotConfiguration {
            tone: Tone::Assertive,
            ..BotConfiguration::default()
        });
        assert_eq!(handle.snapshot().tone, Tone::Assertive);
    }
}
