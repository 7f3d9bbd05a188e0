//! Device pairing and the messaging transport for LexClaw.
//!
//! - **Pairing** — `PairingSession` state machine with rotating tokens
//! - **Verifier** — credential verification seam (`SimulatedVerifier` by default)
//! - **Service** — timer-driven `PairingService` publishing domain events
//! - **WhatsApp** — `Channel` adapter that only carries traffic while paired

pub mod pairing;
pub mod service;
pub mod verifier;
pub mod whatsapp;

pub use pairing::{PairingSession, PairingSnapshot, PairingToken, TickOutcome, Transition};
pub use service::PairingService;
pub use verifier::{CredentialVerifier, SimulatedVerifier, Verdict};
pub use whatsapp::WhatsAppChannel;
