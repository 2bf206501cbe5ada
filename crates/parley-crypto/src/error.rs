//! Error types for cryptographic operations.

use thiserror::Error;

/// Errors from sealing or opening messages.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Decryption failed: wrong key, tampered ciphertext, or mismatched
    /// associated data (sequence number).
    #[error("decryption failed: {reason}")]
    DecryptionFailed {
        /// What went wrong.
        reason: String,
    },
}
