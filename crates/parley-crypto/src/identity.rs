//! Long-term X25519 identity keypairs.
//!
//! One keypair identifies a user across all conversations. The secret
//! half never leaves the local store; the public half is announced to
//! peers through the relay.

use x25519_dalek::{PublicKey, StaticSecret};

/// A peer's long-term public key as received off the wire.
pub type PeerPublicKey = PublicKey;

/// Size of the stored keypair encoding (`secret || public`).
pub const IDENTITY_STORED_SIZE: usize = 64;

/// Long-term X25519 identity keypair.
///
/// # Security
///
/// - The secret scalar is zeroized on drop (`StaticSecret` guarantees
///   this).
/// - Callers MUST provide cryptographically secure random bytes when
///   generating a keypair in production.
#[derive(Clone)]
pub struct IdentityKeypair {
    secret: StaticSecret,
    public: PublicKey,
}

impl IdentityKeypair {
    /// Build a keypair from 32 caller-provided random bytes.
    ///
    /// The bytes become the X25519 secret scalar (clamped internally by
    /// the curve implementation); the public key is derived from it.
    #[must_use]
    pub fn from_secret_bytes(secret_bytes: [u8; 32]) -> Self {
        let secret = StaticSecret::from(secret_bytes);
        let public = PublicKey::from(&secret);
        Self { secret, public }
    }

    /// The public half, announced to peers.
    #[must_use]
    pub fn public(&self) -> &PublicKey {
        &self.public
    }

    /// Raw public key bytes for the wire.
    #[must_use]
    pub fn public_bytes(&self) -> [u8; 32] {
        *self.public.as_bytes()
    }

    /// The secret half, used for key agreement. Never transmitted.
    #[must_use]
    pub fn secret(&self) -> &StaticSecret {
        &self.secret
    }

    /// Encode for persistence as `secret || public` (64 bytes).
    #[must_use]
    pub fn to_stored_bytes(&self) -> [u8; IDENTITY_STORED_SIZE] {
        let mut out = [0u8; IDENTITY_STORED_SIZE];
        out[..32].copy_from_slice(&self.secret.to_bytes());
        out[32..].copy_from_slice(self.public.as_bytes());
        out
    }

    /// Decode a persisted keypair. `None` if the entry is malformed.
    ///
    /// The public half is recomputed from the secret; a stored public key
    /// that does not match is treated as corruption, not trusted.
    #[must_use]
    pub fn from_stored_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != IDENTITY_STORED_SIZE {
            return None;
        }

        let mut secret_bytes = [0u8; 32];
        secret_bytes.copy_from_slice(&bytes[..32]);

        let keypair = Self::from_secret_bytes(secret_bytes);
        if keypair.public.as_bytes()[..] != bytes[32..] {
            return None;
        }

        Some(keypair)
    }
}

impl std::fmt::Debug for IdentityKeypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Secret scalar intentionally omitted.
        f.debug_struct("IdentityKeypair").field("public", &self.public).finish_non_exhaustive()
    }
}
