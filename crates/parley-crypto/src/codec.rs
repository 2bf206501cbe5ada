//! Message sealing using XChaCha20-Poly1305.
//!
//! All functions are pure - random bytes must be provided by the caller.
//! This enables deterministic testing and keeps the session state machine
//! free of I/O.

use chacha20poly1305::{
    XChaCha20Poly1305, XNonce,
    aead::{Aead, KeyInit, Payload},
};

use crate::{error::CryptoError, session::SessionKey};

/// Size of the XChaCha20 nonce (24 bytes).
pub const NONCE_SIZE: usize = 24;

/// Poly1305 tag size (16 bytes).
const POLY1305_TAG_SIZE: usize = 16;

/// A sealed message ready for the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedMessage {
    /// The 24-byte XChaCha20 nonce used for this encryption.
    pub nonce: [u8; NONCE_SIZE],
    /// The ciphertext including the 16-byte Poly1305 tag.
    pub ciphertext: Vec<u8>,
}

impl SealedMessage {
    /// Plaintext length (ciphertext length minus authentication tag).
    #[must_use]
    pub fn plaintext_len(&self) -> usize {
        self.ciphertext.len().saturating_sub(POLY1305_TAG_SIZE)
    }
}

/// Seal a message under the session key.
///
/// The sequence number is bound into the authentication tag as associated
/// data (its decimal string form, matching the wire convention), so a
/// ciphertext replayed under a different sequence number fails to open.
///
/// # Security
///
/// - Caller MUST provide a fresh, cryptographically random nonce per
///   encryption in production; the 24-byte extended nonce makes random
///   generation collision-safe under a single key.
/// - A given (session key, seq) pair must be used for at most one
///   encryption; the sequence counter upstream guarantees this.
pub fn seal_message(
    plaintext: &[u8],
    seq: u64,
    key: &SessionKey,
    nonce: [u8; NONCE_SIZE],
) -> SealedMessage {
    let cipher = XChaCha20Poly1305::new(key.key().into());
    let aad = seq.to_string();

    let Ok(ciphertext) = cipher.encrypt(
        XNonce::from_slice(&nonce),
        Payload { msg: plaintext, aad: aad.as_bytes() },
    ) else {
        unreachable!("XChaCha20-Poly1305 encryption cannot fail with valid inputs");
    };

    SealedMessage { nonce, ciphertext }
}

/// Open a sealed message.
///
/// Returns the decrypted plaintext.
///
/// # Errors
///
/// - `CryptoError::DecryptionFailed` if the authentication tag does not
///   verify: wrong key, tampered ciphertext or nonce, or a sequence
///   number differing from the one bound at sealing time
pub fn open_message(
    sealed: &SealedMessage,
    seq: u64,
    key: &SessionKey,
) -> Result<Vec<u8>, CryptoError> {
    let cipher = XChaCha20Poly1305::new(key.key().into());
    let aad = seq.to_string();

    cipher
        .decrypt(
            XNonce::from_slice(&sealed.nonce),
            Payload { msg: sealed.ciphertext.as_slice(), aad: aad.as_bytes() },
        )
        .map_err(|_| CryptoError::DecryptionFailed {
            reason: "authentication failed".to_string(),
        })
}
