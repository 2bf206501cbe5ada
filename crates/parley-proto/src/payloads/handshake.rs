//! Key exchange payload types.

use serde::{Deserialize, Serialize};

/// Addressed public key announcement.
///
/// Sent to a specific peer (recipient in the frame header) when joining a
/// conversation, and re-sent on receipt of the peer's announcement if our
/// own key has not gone out within the re-announcement cooldown. The relay
/// forwards it verbatim; it carries no secret material.
///
/// # Security
///
/// The announcement is NOT authenticated - a hostile relay can substitute
/// keys (trust-on-first-use model). The cached copy on the receiving side
/// pins the first key seen for a peer; later announcements with different
/// material are ignored by the session layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyAnnounce {
    /// The sender's long-term X25519 public key.
    pub public_key: [u8; 32],
}
