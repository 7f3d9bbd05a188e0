//! Credential verification seam between `Authenticating` and its outcome.

use async_trait::async_trait;
use std::time::Duration;

use crate::pairing::PairingToken;

/// Result of verifying a presented credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    Rejected { reason: String },
}

/// Checks a presented credential against the transport.
///
/// A real transport would await its handshake here.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn verify(&self, token: &PairingToken) -> Verdict;
}

/// Accepts every credential after a fixed delay.
#[derive(Debug, Clone)]
pub struct SimulatedVerifier {
    delay: Duration,
}

impl SimulatedVerifier {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl CredentialVerifier for SimulatedVerifier {
    async fn verify(&self, token: &PairingToken) -> Verdict {
        tracing::debug!(
            generation = token.generation(),
            delay_ms = self.delay.as_millis() as u64,
            "Simulating handshake"
        );
        tokio::time::sleep(self.delay).await;
        Verdict::Accepted
    }
}
