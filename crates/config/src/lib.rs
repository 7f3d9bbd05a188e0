//! Configuration loading, validation, and management for LexClaw.
//!
//! Loads configuration from `~/.lexclaw/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use lexclaw_core::bot::BotConfiguration;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Environment variables checked for the backend credential, in priority order.
pub const API_KEY_ENV_VARS: [&str; 3] = ["LEXCLAW_API_KEY", "GEMINI_API_KEY", "API_KEY"];

/// The root configuration structure.
///
/// Maps directly to `~/.lexclaw/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Backend API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default LLM provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Sampling temperature for every reply
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Assistant identity, tone and knowledge
    #[serde(default)]
    pub bot: BotConfiguration,

    /// Device pairing settings
    #[serde(default)]
    pub pairing: PairingConfig,

    /// Conversation context settings
    #[serde(default)]
    pub conversation: ConversationConfig,

    /// Responder call settings
    #[serde(default)]
    pub responder: ResponderConfig,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "gemini".into()
}
fn default_model() -> String {
    "gemini-2.5-flash".into()
}
fn default_temperature() -> f32 {
    0.7
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("temperature", &self.temperature)
            .field("bot", &self.bot)
            .field("pairing", &self.pairing)
            .field("conversation", &self.conversation)
            .field("responder", &self.responder)
            .field("gateway", &self.gateway)
            .field("providers", &self.providers)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairingConfig {
    /// How many ticks a pairing token stays valid
    #[serde(default = "default_token_validity_ticks")]
    pub token_validity_ticks: u32,

    /// Length of one tick in milliseconds
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Simulated credential verification latency
    #[serde(default = "default_authentication_delay_ms")]
    pub authentication_delay_ms: u64,

    /// Name shown for the paired session
    #[serde(default = "default_session_name")]
    pub session_name: String,
}

fn default_token_validity_ticks() -> u32 {
    15
}
fn default_tick_interval_ms() -> u64 {
    1000
}
fn default_authentication_delay_ms() -> u64 {
    2000
}
fn default_session_name() -> String {
    "Adam Office Main".into()
}

impl Default for PairingConfig {
    fn default() -> Self {
        Self {
            token_validity_ticks: default_token_validity_ticks(),
            tick_interval_ms: default_tick_interval_ms(),
            authentication_delay_ms: default_authentication_delay_ms(),
            session_name: default_session_name(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// Most recent messages replayed as context (0 = all)
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_history_limit() -> usize {
    40
}

impl ConversationConfig {
    /// The context window as an optional bound.
    pub fn history_window(&self) -> Option<usize> {
        (self.history_limit > 0).then_some(self.history_limit)
    }
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponderConfig {
    /// Upper bound on a single backend call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Reply used when the backend answers without text
    #[serde(default = "default_empty_reply")]
    pub empty_reply: String,

    /// Reply used when the backend call fails or times out
    #[serde(default = "default_failure_reply")]
    pub failure_reply: String,
}

fn default_timeout_secs() -> u64 {
    60
}
fn default_empty_reply() -> String {
    "Desculpe, não consegui processar sua solicitação no momento.".into()
}
fn default_failure_reply() -> String {
    "Ocorreu um erro ao conectar com o assistente inteligente. Por favor, tente novamente.".into()
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            empty_reply: default_empty_reply(),
            failure_reply: default_failure_reply(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    42618
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.lexclaw/config.toml).
    ///
    /// Also checks environment variables:
    /// - `LEXCLAW_API_KEY`, `GEMINI_API_KEY`, `API_KEY` (first set wins)
    /// - `LEXCLAW_PROVIDER`, `LEXCLAW_MODEL`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.api_key.is_none() {
            self.api_key = API_KEY_ENV_VARS
                .iter()
                .find_map(|name| lookup(name).filter(|v| !v.trim().is_empty()));
        }

        if let Some(provider) = lookup("LEXCLAW_PROVIDER") {
            self.default_provider = provider;
        }

        if let Some(model) = lookup("LEXCLAW_MODEL") {
            self.default_model = model;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".lexclaw")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.pairing.token_validity_ticks == 0 {
            return Err(ConfigError::ValidationError(
                "pairing.token_validity_ticks must be at least 1".into(),
            ));
        }

        if self.pairing.tick_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "pairing.tick_interval_ms must be at least 1".into(),
            ));
        }

        if self.responder.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "responder.timeout_secs must be at least 1".into(),
            ));
        }

        Ok(())
    }

    /// The credential for `provider`: its own non-blank key, else the
    /// global one. Blank keys count as unset.
    pub fn api_key_for(&self, provider: &str) -> Option<&str> {
        let non_blank = |k: &&str| !k.trim().is_empty();

        self.providers
            .get(provider)
            .and_then(|p| p.api_key.as_deref())
            .filter(non_blank)
            .or_else(|| self.api_key.as_deref().filter(non_blank))
    }

    /// The backend credential, or a fatal configuration error.
    ///
    /// Called once at startup, before any provider is built.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key_for(&self.default_provider)
            .ok_or_else(|| ConfigError::MissingCredential {
                provider: self.default_provider.clone(),
            })
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            temperature: default_temperature(),
            bot: BotConfiguration::default(),
            pairing: PairingConfig::default(),
            conversation: ConversationConfig::default(),
            responder: ResponderConfig::default(),
            gateway: GatewayConfig::default(),
            providers: HashMap::new(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    #[error("No API key for provider '{provider}' (set LEXCLAW_API_KEY, GEMINI_API_KEY or API_KEY)")]
    MissingCredential { provider: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexclaw_core::bot::Tone;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.default_provider, "gemini");
        assert_eq!(config.pairing.token_validity_ticks, 15);
        assert_eq!(config.gateway.port, 42618);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.default_provider, config.default_provider);
        assert_eq!(parsed.bot, config.bot);
        assert_eq!(parsed.pairing.session_name, "Adam Office Main");
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            temperature: 5.0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_validity_window_rejected() {
        let mut config = AppConfig::default();
        config.pairing.token_validity_ticks = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.default_model, "gemini-2.5-flash");
    }

    #[test]
    fn loads_bot_section_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
temperature = 0.4

[bot]
company_name = "Silva & Souza"
assistant_name = "Ana"
tone = "amigavel"
contact_phone = "(21) 3333-3333"
system_instruction = "X"
knowledge_base = "Y"

[conversation]
history_limit = 0
"#
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.bot.company_name, "Silva & Souza");
        assert_eq!(config.bot.tone, Tone::Friendly);
        assert_eq!(config.conversation.history_window(), None);
        assert!((config.temperature - 0.4).abs() < f32::EPSILON);
    }

    #[test]
    fn unknown_tone_fails_to_parse() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[bot]
company_name = "A"
assistant_name = "B"
tone = "sarcastic"
contact_phone = "C"
system_instruction = "D"
knowledge_base = "E"
"#
        )
        .unwrap();

        assert!(matches!(
            AppConfig::load_from(file.path()),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn missing_credential_is_fatal() {
        let config = AppConfig::default();
        assert!(matches!(
            config.require_api_key(),
            Err(ConfigError::MissingCredential { .. })
        ));
    }

    #[test]
    fn provider_key_takes_precedence() {
        let mut config = AppConfig {
            api_key: Some("global".into()),
            ..AppConfig::default()
        };
        assert_eq!(config.require_api_key().unwrap(), "global");

        config.providers.insert(
            "gemini".into(),
            ProviderConfig {
                api_key: Some("per-provider".into()),
                api_url: None,
                default_model: None,
            },
        );
        assert_eq!(config.require_api_key().unwrap(), "per-provider");
    }

    #[test]
    fn blank_provider_key_falls_back_to_global() {
        let mut config = AppConfig {
            api_key: Some("global".into()),
            ..AppConfig::default()
        };
        config.providers.insert(
            "gemini".into(),
            ProviderConfig {
                api_key: Some("   ".into()),
                api_url: None,
                default_model: None,
            },
        );
        assert_eq!(config.require_api_key().unwrap(), "global");
        assert_eq!(config.api_key_for("gemini"), Some("global"));

        config.api_key = Some(String::new());
        assert!(matches!(
            config.require_api_key(),
            Err(ConfigError::MissingCredential { .. })
        ));
    }

    #[test]
    fn env_overrides_follow_priority() {
        let mut config = AppConfig::default();
        config.apply_env(|name| match name {
            "GEMINI_API_KEY" => Some("from-gemini".into()),
            "API_KEY" => Some("from-generic".into()),
            "LEXCLAW_MODEL" => Some("gemini-2.5-pro".into()),
            _ => None,
        });
        assert_eq!(config.api_key.as_deref(), Some("from-gemini"));
        assert_eq!(config.default_model, "gemini-2.5-pro");
        assert_eq!(config.default_provider, "gemini");
    }

    #[test]
    fn env_does_not_override_file_key() {
        let mut config = AppConfig {
            api_key: Some("from-file".into()),
            ..AppConfig::default()
        };
        config.apply_env(|_| Some("from-env".into()));
        assert_eq!(config.api_key.as_deref(), Some("from-file"));
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = AppConfig {
            api_key: Some("secret-key".into()),
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret-key"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("gemini-2.5-flash"));
        assert!(toml_str.contains("Adam Advocacia"));
    }
}
