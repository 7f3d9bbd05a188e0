//! Device-pairing state machine.
//!
//! `PairingSession` is pure: no timers, no I/O. The `PairingService` drives it
//! with a periodic tick and runs credential verification asynchronously.
//!
//! ```text
//!   AwaitingScan ──present_credential──▶ Authenticating ──accepted──▶ Connected
//!        ▲  │ tick (rotate on expiry)          │ rejected                 │
//!        │  └──────────┘                       ▼                          │ disconnect
//!        └──────────────────────────────── AwaitingScan ◀── Disconnected ◀┘
//! ```

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use lexclaw_core::channel::PairingStatus;
use lexclaw_core::error::PairingError;
use serde::Serialize;

/// Remaining ticks at or below which the token is flagged as about to expire.
pub const EXPIRING_SOON_TICKS: u32 = 2;

/// An opaque, time-bounded credential surrogate shown to the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairingToken {
    value: String,
    generation: u64,
}

impl PairingToken {
    /// Issue a fresh token. The generation prefix keeps values distinct
    /// across rotations even if the random suffix were to repeat.
    fn issue(generation: u64) -> Self {
        let bytes: [u8; 18] = rand::random();
        Self {
            value: format!("{generation}@{}", URL_SAFE_NO_PAD.encode(bytes)),
            generation,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// A status change produced by a session operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: PairingStatus,
    pub to: PairingStatus,
}

/// What a single timer tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not awaiting a scan; the countdown is frozen.
    Frozen,
    /// The countdown advanced.
    Countdown { remaining: u32 },
    /// The window expired and a new token was issued.
    Rotated { generation: u64 },
}

/// Read-only view for the pairing UI.
#[derive(Debug, Clone, Serialize)]
pub struct PairingSnapshot {
    pub status: PairingStatus,
    /// Present only while awaiting a scan or authenticating.
    pub token: Option<String>,
    pub generation: u64,
    pub remaining_ticks: u32,
    pub validity_ticks: u32,
    pub expiring_soon: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connected_at: Option<DateTime<Utc>>,
}

#[derive(Debug)]
pub struct PairingSession {
    status: PairingStatus,
    token: PairingToken,
    remaining: u32,
    validity: u32,
    session_name: String,
    connected_at: Option<DateTime<Utc>>,
    attempt: u64,
}

impl PairingSession {
    /// Enter the connect flow: `AwaitingScan` with a fresh token.
    ///
    /// A zero validity window is treated as one tick.
    pub fn new(validity_ticks: u32, session_name: impl Into<String>) -> Self {
        let validity = validity_ticks.max(1);
        Self {
            status: PairingStatus::AwaitingScan,
            token: PairingToken::issue(1),
            remaining: validity,
            validity,
            session_name: session_name.into(),
            connected_at: None,
            attempt: 0,
        }
    }

    pub fn current_status(&self) -> PairingStatus {
        self.status
    }

    pub fn token(&self) -> &PairingToken {
        &self.token
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn validity(&self) -> u32 {
        self.validity
    }

    /// Advance the validity countdown by one tick.
    ///
    /// Only runs while awaiting a scan; expiry rotates the token and resets
    /// the window.
    pub fn tick(&mut self) -> TickOutcome {
        if self.status != PairingStatus::AwaitingScan {
            return TickOutcome::Frozen;
        }

        if self.remaining <= 1 {
            self.rotate();
            TickOutcome::Rotated {
                generation: self.token.generation,
            }
        } else {
            self.remaining -= 1;
            TickOutcome::Countdown {
                remaining: self.remaining,
            }
        }
    }

    /// A device presented the current token. Returns the attempt id that
    /// must accompany the verification result.
    pub fn present_credential(&mut self) -> Result<(u64, Transition), PairingError> {
        if self.status != PairingStatus::AwaitingScan {
            return Err(PairingError::InvalidTransition {
                from: self.status,
                action: "present a credential",
            });
        }

        self.attempt += 1;
        Ok((self.attempt, self.set_status(PairingStatus::Authenticating)))
    }

    /// Resolve an authentication attempt.
    ///
    /// Accepted → `Connected`. Rejected → `AwaitingScan`. Either way the
    /// scanned token is spent and a fresh one is issued. Results for
    /// superseded attempts are refused with `StaleAttempt`.
    pub fn complete_authentication(
        &mut self,
        attempt: u64,
        accepted: bool,
    ) -> Result<Transition, PairingError> {
        if attempt != self.attempt || self.status != PairingStatus::Authenticating {
            return Err(PairingError::StaleAttempt(attempt));
        }

        self.rotate();
        if accepted {
            self.connected_at = Some(Utc::now());
            Ok(self.set_status(PairingStatus::Connected))
        } else {
            Ok(self.set_status(PairingStatus::AwaitingScan))
        }
    }

    /// Tear the session down: `Disconnected`, then back to `AwaitingScan`
    /// with a fresh token.
    pub fn disconnect(&mut self) -> Result<[Transition; 2], PairingError> {
        match self.status {
            PairingStatus::Connected | PairingStatus::Authenticating => {
                let down = self.set_status(PairingStatus::Disconnected);
                self.connected_at = None;
                self.rotate();
                let up = self.set_status(PairingStatus::AwaitingScan);
                Ok([down, up])
            }
            from => Err(PairingError::InvalidTransition {
                from,
                action: "disconnect",
            }),
        }
    }

    pub fn snapshot(&self) -> PairingSnapshot {
        let connected = self.status == PairingStatus::Connected;
        let token_visible = matches!(
            self.status,
            PairingStatus::AwaitingScan | PairingStatus::Authenticating
        );

        PairingSnapshot {
            status: self.status,
            token: token_visible.then(|| self.token.value.clone()),
            generation: self.token.generation,
            remaining_ticks: self.remaining,
            validity_ticks: self.validity,
            expiring_soon: self.status == PairingStatus::AwaitingScan
                && self.remaining <= EXPIRING_SOON_TICKS,
            session_name: connected.then(|| self.session_name.clone()),
            connected_at: self.connected_at,
        }
    }

    fn rotate(&mut self) {
        self.token = PairingToken::issue(self.token.generation + 1);
        self.remaining = self.validity;
    }

    fn set_status(&mut self, to: PairingStatus) -> Transition {
        let from = std::mem::replace(&mut self.status, to);
        Transition { from, to }
    }
}
