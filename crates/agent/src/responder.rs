//! Responder client — one backend call per inbound client message.

use std::sync::Arc;
use std::time::{Duration, Instant};

use lexclaw_config::AppConfig;
use lexclaw_core::error::ResponderError;
use lexclaw_core::provider::Provider;
use tracing::{debug, warn};

use crate::context::PromptDocument;

/// Wraps a `Provider` with the model settings, a bounded timeout and the
/// localized fallback texts.
pub struct ResponderClient {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    timeout: Duration,
    empty_reply: String,
    failure_reply: String,
}

impl ResponderClient {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        let defaults = lexclaw_config::ResponderConfig::default();
        Self {
            provider,
            model: model.into(),
            temperature: 0.7,
            timeout: Duration::from_secs(defaults.timeout_secs),
            empty_reply: defaults.empty_reply,
            failure_reply: defaults.failure_reply,
        }
    }

    pub fn from_config(provider: Arc<dyn Provider>, config: &AppConfig) -> Self {
        Self {
            provider,
            model: config.default_model.clone(),
            temperature: config.temperature,
            timeout: Duration::from_secs(config.responder.timeout_secs),
            empty_reply: config.responder.empty_reply.clone(),
            failure_reply: config.responder.failure_reply.clone(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Text shown in place of a reply when the call fails.
    pub fn failure_reply(&self) -> &str {
        &self.failure_reply
    }

    /// Issue exactly one backend call.
    ///
    /// Returns the trimmed reply, or the empty-reply fallback when the
    /// backend answered without text. Transport, credential, backend and
    /// timeout failures come back as `ResponderError`.
    pub async fn complete(
        &self,
        prompt: &PromptDocument,
        new_user_text: &str,
    ) -> Result<String, ResponderError> {
        let request = prompt
            .clone()
            .into_request(&self.model, new_user_text, self.temperature);

        let start = Instant::now();
        let result = tokio::time::timeout(self.timeout, self.provider.complete(request)).await;

        let response = match result {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                warn!(provider = %self.provider.name(), error = %e, "Responder call failed");
                return Err(ResponderError::Backend(e));
            }
            Err(_) => {
                warn!(
                    provider = %self.provider.name(),
                    timeout_secs = self.timeout.as_secs(),
                    "Responder call timed out"
                );
                return Err(ResponderError::Timeout {
                    after_secs: self.timeout.as_secs(),
                });
            }
        };

        debug!(
            provider = %self.provider.name(),
            model = %response.model,
            duration_ms = start.elapsed().as_millis() as u64,
            "Responder call completed"
        );

        let text = response
            .text
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| self.empty_reply.clone());

        Ok(text)
    }
}
