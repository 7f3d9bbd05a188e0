//! Shared mock providers for agent tests.

use lexclaw_core::error::ProviderError;
use lexclaw_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use std::sync::Mutex;
use tokio::sync::Semaphore;

/// Returns scripted replies in order and records every request.
///
/// Panics if more calls are made than replies provided.
pub struct ScriptedProvider {
    replies: Mutex<Vec<Option<String>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<Option<String>>) -> Self {
        Self {
            replies: Mutex::new(replies),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Some(t.to_string())).collect())
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<ProviderRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request);
            requests.len() - 1
        };

        let replies = self.replies.lock().unwrap();
        let text = replies
            .get(call)
            .unwrap_or_else(|| {
                panic!(
                    "ScriptedProvider: no more replies (call #{}, have {})",
                    call,
                    replies.len()
                )
            })
            .clone();

        Ok(make_response(text))
    }
}

/// Always fails with the configured error.
pub struct FailingProvider {
    error: ProviderError,
}

impl FailingProvider {
    pub fn network() -> Self {
        Self {
            error: ProviderError::Network("connection refused".into()),
        }
    }
}

#[async_trait::async_trait]
impl Provider for FailingProvider {
    fn name(&self) -> &str {
        "failing_mock"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        Err(self.error.clone())
    }
}

/// Never answers.
pub struct PendingProvider;

#[async_trait::async_trait]
impl Provider for PendingProvider {
    fn name(&self) -> &str {
        "pending_mock"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        std::future::pending().await
    }
}

/// Panics inside the call.
pub struct PanickingProvider;

#[async_trait::async_trait]
impl Provider for PanickingProvider {
    fn name(&self) -> &str {
        "panicking_mock"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        panic!("backend exploded")
    }
}

/// Holds each call until the test releases a permit.
pub struct GatedProvider {
    gate: Semaphore,
    inner: ScriptedProvider,
}

impl GatedProvider {
    pub fn replying(texts: &[&str]) -> Self {
        Self {
            gate: Semaphore::new(0),
            inner: ScriptedProvider::replying(texts),
        }
    }

    /// Let one pending call through.
    pub fn release(&self) {
        self.gate.add_permits(1);
    }

    pub fn call_count(&self) -> usize {
        self.inner.call_count()
    }

    pub fn last_request(&self) -> Option<ProviderRequest> {
        self.inner.last_request()
    }
}

#[async_trait::async_trait]
impl Provider for GatedProvider {
    fn name(&self) -> &str {
        "gated_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let call_index = {
            let mut requests = self.inner.requests.lock().unwrap();
            requests.push(request);
            requests.len() - 1
        };
        if let Ok(permit) = self.gate.acquire().await {
            permit.forget();
        }

        let text = self.inner.replies.lock().unwrap().get(call_index).cloned().flatten();
        Ok(make_response(text))
    }
}

pub fn make_response(text: Option<String>) -> ProviderResponse {
    ProviderResponse {
        text,
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}
