//! Application message payload types.

use serde::{Deserialize, Serialize};

/// One encrypted message.
///
/// Primary payload for user-to-user communication. The plaintext is
/// sealed with XChaCha20-Poly1305 under the per-conversation session key;
/// the sequence number is bound into the authentication tag as associated
/// data, so a relay that re-labels a ciphertext with a different `seq`
/// produces a message that fails to open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CipherMessage {
    /// Sender-assigned sequence number, strictly increasing per direction.
    pub seq: u64,

    /// Random 24-byte XChaCha20 nonce, unique per encryption.
    pub nonce: [u8; 24],

    /// Ciphertext including the 16-byte Poly1305 authentication tag.
    pub ciphertext: Vec<u8>,
}
