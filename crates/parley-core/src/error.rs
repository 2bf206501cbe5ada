//! Error types for the persistence boundaries.

use thiserror::Error;

/// Errors from the external key/value and history stores.
///
/// Store unavailability is the only unrecoverable failure in the
/// secure-session subsystem: without access to the identity keypair no
/// conversation is possible. Everything else (bad ciphertext, replays)
/// degrades to dropping a single message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The underlying store cannot be reached.
    #[error("store unavailable: {reason}")]
    Unavailable {
        /// What went wrong.
        reason: String,
    },
}
