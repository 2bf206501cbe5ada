//! Session
//!
//! Action-based session state machine for one Parley conversation.
//! Manages peer key exchange, session-key derivation, message sealing,
//! anti-replay sequence tracking, and transcript reconciliation.
//!
//! # Architecture
//!
//! The session follows the Sans-IO and Action-Based patterns. It receives
//! events ([`SessionEvent`]), processes them through pure state machine
//! logic, and returns actions ([`SessionAction`]) for the caller to
//! execute. The caller owns all I/O: the relay connection, the history
//! fetch, and the key/value store writes requested by actions.
//!
//! # Components
//!
//! - [`Session`]: The per-conversation state machine
//! - [`SequenceTracker`]: Monotonic send/receive counters and
//!   anti-replay policy
//! - [`Transcript`]: Time-ordered view of decrypted messages
//! - [`SessionEvent`] / [`SessionAction`]: The event/action vocabulary

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod error;
mod event;
mod sequence;
mod session;
mod transcript;

pub use error::SessionError;
pub use event::{SessionAction, SessionEvent};
pub use parley_core::env::Environment;
pub use sequence::SequenceTracker;
pub use session::{HandshakeState, Session, SessionConfig};
pub use transcript::{Direction, HistorySeed, Transcript, TranscriptEntry, reconcile_history};
