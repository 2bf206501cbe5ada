//! Session key derivation from X25519 key agreement.

use hkdf::Hkdf;
use sha2::Sha256;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroize;

/// Domain-separation label for chat session keys.
const SESSION_KEY_LABEL: &[u8] = b"chat-session-key";

/// Fixed derivation index for the session key.
const SESSION_KEY_INDEX: u64 = 1;

/// Size of the derived session key in bytes.
pub const SESSION_KEY_SIZE: usize = 32;

/// Symmetric session key for one conversation.
///
/// Held only in volatile memory for the lifetime of one conversation
/// view; never persisted. Zeroized on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionKey {
    key: [u8; SESSION_KEY_SIZE],
}

impl SessionKey {
    /// The raw 32-byte key for the AEAD.
    #[must_use]
    pub fn key(&self) -> &[u8; SESSION_KEY_SIZE] {
        &self.key
    }
}

impl Drop for SessionKey {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

impl std::fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Key material intentionally omitted.
        f.write_str("SessionKey(..)")
    }
}

/// Derive the shared session key for a conversation.
///
/// Computes the X25519 shared secret from our secret scalar and the
/// peer's public key, then expands it with HKDF-SHA256 using a fixed
/// domain-separation label and derivation index.
///
/// # Security
///
/// - Deterministic: no randomness in this step. Both parties, each using
///   their own secret and the other's public key, produce byte-identical
///   output. This symmetry is the correctness property that replaces a
///   trusted key-exchange server.
/// - The HKDF label separates chat session keys from any other use of
///   the same shared secret.
pub fn derive_session_key(own_secret: &StaticSecret, peer_public: &PublicKey) -> SessionKey {
    let shared = own_secret.diffie_hellman(peer_public);

    let hkdf = Hkdf::<Sha256>::new(None, shared.as_bytes());

    // Info parameter: label || index
    // Capacity: 16 (label) + 8 (index) = 24
    let mut info = Vec::with_capacity(24);
    info.extend_from_slice(SESSION_KEY_LABEL);
    info.extend_from_slice(&SESSION_KEY_INDEX.to_be_bytes());

    let mut key = [0u8; SESSION_KEY_SIZE];
    let Ok(()) = hkdf.expand(&info, &mut key) else {
        unreachable!("32 bytes is a valid HKDF-SHA256 output length");
    };

    SessionKey { key }
}
