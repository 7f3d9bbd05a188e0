//! Pairing service — drives a `PairingSession` with a periodic timer and
//! runs credential verification off the caller's path.

use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::Utc;
use lexclaw_config::PairingConfig;
use lexclaw_core::channel::PairingStatus;
use lexclaw_core::error::PairingError;
use lexclaw_core::event::{DomainEvent, EventBus};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::pairing::{PairingSession, PairingSnapshot, TickOutcome, Transition};
use crate::verifier::{CredentialVerifier, SimulatedVerifier, Verdict};

pub struct PairingService {
    session: Mutex<PairingSession>,
    verifier: Arc<dyn CredentialVerifier>,
    events: Arc<EventBus>,
    tick_interval: Duration,
    status_tx: watch::Sender<PairingStatus>,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl PairingService {
    pub fn new(
        config: &PairingConfig,
        verifier: Arc<dyn CredentialVerifier>,
        events: Arc<EventBus>,
    ) -> Arc<Self> {
        let session = PairingSession::new(config.token_validity_ticks, &config.session_name);
        let (status_tx, _) = watch::channel(session.current_status());

        Arc::new(Self {
            session: Mutex::new(session),
            verifier,
            events,
            tick_interval: Duration::from_millis(config.tick_interval_ms.max(1)),
            status_tx,
            ticker: Mutex::new(None),
        })
    }

    /// Service backed by the always-accepting simulated verifier.
    pub fn simulated(config: &PairingConfig, events: Arc<EventBus>) -> Arc<Self> {
        let verifier = Arc::new(SimulatedVerifier::new(Duration::from_millis(
            config.authentication_delay_ms,
        )));
        Self::new(config, verifier, events)
    }

    /// Start the rotation timer. Calling it again is a no-op.
    pub async fn start(self: &Arc<Self>) {
        let mut ticker = self.ticker.lock().await;
        if ticker.is_some() {
            return;
        }

        let weak: Weak<Self> = Arc::downgrade(self);
        let period = self.tick_interval;

        *ticker = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                let Some(service) = weak.upgrade() else {
                    break;
                };
                service.tick().await;
            }
        }));

        info!(tick_ms = period.as_millis() as u64, "Pairing timer started");
    }

    /// Stop the rotation timer.
    pub async fn stop(&self) {
        if let Some(handle) = self.ticker.lock().await.take() {
            handle.abort();
            info!("Pairing timer stopped");
        }
    }

    /// Apply one timer tick.
    pub async fn tick(&self) -> TickOutcome {
        let mut session = self.session.lock().await;
        let outcome = session.tick();

        if let TickOutcome::Rotated { generation } = outcome {
            debug!(generation, "Pairing token rotated");
            self.token_rotated(generation);
        }

        outcome
    }

    /// Last committed status. Updated under the session lock, so it never
    /// runs ahead of or behind the session.
    pub fn current_status(&self) -> PairingStatus {
        *self.status_tx.borrow()
    }

    /// Watch status changes (used by the transport to gate traffic).
    pub fn subscribe_status(&self) -> watch::Receiver<PairingStatus> {
        self.status_tx.subscribe()
    }

    pub async fn snapshot(&self) -> PairingSnapshot {
        self.session.lock().await.snapshot()
    }

    /// Begin authentication with the current token. Verification completes
    /// in the background; watch the status to observe the outcome.
    pub async fn present_credential(self: &Arc<Self>) -> Result<u64, PairingError> {
        let (attempt, token) = {
            let mut session = self.session.lock().await;
            let (attempt, transition) = session.present_credential()?;
            self.announce(transition);
            (attempt, session.token().clone())
        };

        let service = Arc::clone(self);
        tokio::spawn(async move {
            let verdict = service.verifier.verify(&token).await;
            service.finish_authentication(attempt, verdict).await;
        });

        Ok(attempt)
    }

    /// Disconnect and return to `AwaitingScan` with a fresh token.
    pub async fn disconnect(&self) -> Result<(), PairingError> {
        let mut session = self.session.lock().await;
        let transitions = session.disconnect()?;

        for transition in transitions {
            self.announce(transition);
        }
        self.token_rotated(session.token().generation());

        Ok(())
    }

    async fn finish_authentication(&self, attempt: u64, verdict: Verdict) {
        let accepted = verdict == Verdict::Accepted;

        let mut session = self.session.lock().await;
        match session.complete_authentication(attempt, accepted) {
            Ok(transition) => {
                if let Verdict::Rejected { reason } = &verdict {
                    warn!(attempt, %reason, "Credential rejected");
                }
                self.token_rotated(session.token().generation());
                self.announce(transition);
            }
            Err(e) => debug!(attempt, error = %e, "Discarding verification result"),
        }
    }

    /// Publish a transition. Callers hold the session lock so the watch
    /// follows the session's commit order.
    fn announce(&self, transition: Transition) {
        info!(from = %transition.from, to = %transition.to, "Pairing status changed");
        self.status_tx.send_replace(transition.to);
        self.events.publish(DomainEvent::PairingStatusChanged {
            from: transition.from,
            to: transition.to,
            timestamp: Utc::now(),
        });
    }

    fn token_rotated(&self, generation: u64) {
        self.events.publish(DomainEvent::PairingTokenRotated {
            generation,
            timestamp: Utc::now(),
        });
    }
}
