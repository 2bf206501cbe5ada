//! Transcript reconciliation.
//!
//! Merges decrypted historical messages (fetched out of band) with live
//! decrypted messages into one time-ordered view. History entries carry
//! store-assigned timestamps; live entries carry sender-assigned frame
//! timestamps. Both are Unix milliseconds, so a single ascending order
//! covers the merged view.

use parley_core::history::StoredEnvelope;
use parley_crypto::{SealedMessage, SessionKey, open_message};

/// Whether a transcript entry was produced locally or by the peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Sent by the local user.
    Sent,
    /// Received from the peer.
    Received,
}

/// One decrypted message in the transcript view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    /// Sender-assigned sequence number.
    pub seq: u64,

    /// Stable identifier of the sender.
    pub sender_id: u64,

    /// Decrypted message content.
    pub plaintext: Vec<u8>,

    /// Sent or received, relative to the local user.
    pub direction: Direction,

    /// Timestamp in Unix milliseconds, used for display ordering.
    pub timestamp_ms: u64,
}

/// Time-ordered view of decrypted messages.
///
/// # Invariants
///
/// - Entries are ordered by `timestamp_ms` ascending; equal timestamps
///   keep insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    /// Create an empty transcript.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries in display order.
    #[must_use]
    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the transcript holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consume the transcript, yielding its entries in display order.
    #[must_use]
    pub fn into_entries(self) -> Vec<TranscriptEntry> {
        self.entries
    }

    /// Append an already-decrypted entry, preserving time order.
    ///
    /// Live entries normally arrive with non-decreasing timestamps, so
    /// the scan from the back is O(1) in the common case.
    pub fn append(&mut self, entry: TranscriptEntry) {
        let position = self
            .entries
            .iter()
            .rposition(|existing| existing.timestamp_ms <= entry.timestamp_ms)
            .map_or(0, |i| i + 1);
        self.entries.insert(position, entry);
    }
}

/// Result of seeding a transcript from stored history.
#[derive(Debug, Clone)]
pub struct HistorySeed {
    /// The decrypted, time-ordered transcript.
    pub transcript: Transcript,

    /// Highest sequence number among `Received` entries. `None` if the
    /// history held none; the live anti-replay counter is left untouched
    /// in that case.
    pub max_received_seq: Option<u64>,

    /// Envelopes skipped because they failed to decrypt.
    pub skipped: usize,
}

/// Decrypt stored envelopes into a time-ordered transcript.
///
/// Every envelope is opened with the current session key and tagged
/// `Sent` if its sender is the local user, `Received` otherwise. Entries
/// that fail to decrypt are skipped (counted, not fatal): a single
/// corrupted envelope must not cost the rest of the history.
pub fn reconcile_history(
    envelopes: &[StoredEnvelope],
    session_key: &SessionKey,
    local_user_id: u64,
) -> HistorySeed {
    let mut entries = Vec::with_capacity(envelopes.len());
    let mut skipped = 0usize;
    let mut max_received_seq: Option<u64> = None;

    for envelope in envelopes {
        let sealed =
            SealedMessage { nonce: envelope.nonce, ciphertext: envelope.ciphertext.clone() };

        let Ok(plaintext) = open_message(&sealed, envelope.seq, session_key) else {
            skipped += 1;
            continue;
        };

        let direction = if envelope.sender_id == local_user_id {
            Direction::Sent
        } else {
            max_received_seq = Some(max_received_seq.map_or(envelope.seq, |m| m.max(envelope.seq)));
            Direction::Received
        };

        entries.push(TranscriptEntry {
            seq: envelope.seq,
            sender_id: envelope.sender_id,
            plaintext,
            direction,
            timestamp_ms: envelope.timestamp_ms,
        });
    }

    entries.sort_by_key(|entry| entry.timestamp_ms);

    HistorySeed { transcript: Transcript { entries }, max_received_seq, skipped }
}

#[cfg(test)]
mod tests {
    use parley_crypto::{IdentityKeypair, derive_session_key, seal_message};

    use super::*;

    const LOCAL: u64 = 1;
    const PEER: u64 = 2;

    fn test_session_key() -> SessionKey {
        let local = IdentityKeypair::from_secret_bytes([0x0A; 32]);
        let peer = IdentityKeypair::from_secret_bytes([0x0B; 32]);
        derive_session_key(local.secret(), peer.public())
    }

    fn sealed_envelope(
        key: &SessionKey,
        sender_id: u64,
        seq: u64,
        plaintext: &[u8],
        timestamp_ms: u64,
    ) -> StoredEnvelope {
        let sealed = seal_message(plaintext, seq, key, [seq as u8; 24]);
        StoredEnvelope {
            sender_id,
            seq,
            nonce: sealed.nonce,
            ciphertext: sealed.ciphertext,
            timestamp_ms,
        }
    }

    fn entry(seq: u64, timestamp_ms: u64) -> TranscriptEntry {
        TranscriptEntry {
            seq,
            sender_id: PEER,
            plaintext: b"x".to_vec(),
            direction: Direction::Received,
            timestamp_ms,
        }
    }

    #[test]
    fn append_keeps_time_order() {
        let mut transcript = Transcript::new();
        transcript.append(entry(0, 100));
        transcript.append(entry(1, 300));
        transcript.append(entry(2, 200)); // arrives late

        let times: Vec<u64> = transcript.entries().iter().map(|e| e.timestamp_ms).collect();
        assert_eq!(times, vec![100, 200, 300]);
    }

    #[test]
    fn append_equal_timestamps_keep_insertion_order() {
        let mut transcript = Transcript::new();
        transcript.append(entry(0, 100));
        transcript.append(entry(1, 100));

        let seqs: Vec<u64> = transcript.entries().iter().map(|e| e.seq).collect();
        assert_eq!(seqs, vec![0, 1]);
    }

    #[test]
    fn reconcile_tags_directions_and_sorts_by_timestamp() {
        let key = test_session_key();
        let envelopes = vec![
            sealed_envelope(&key, PEER, 1, b"second from peer", 3_000),
            sealed_envelope(&key, LOCAL, 0, b"from me", 1_000),
            sealed_envelope(&key, PEER, 0, b"first from peer", 2_000),
        ];

        let seed = reconcile_history(&envelopes, &key, LOCAL);

        assert_eq!(seed.skipped, 0);
        assert_eq!(seed.max_received_seq, Some(1));

        let entries = seed.transcript.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].plaintext, b"from me");
        assert_eq!(entries[0].direction, Direction::Sent);
        assert_eq!(entries[1].plaintext, b"first from peer");
        assert_eq!(entries[1].direction, Direction::Received);
        assert_eq!(entries[2].plaintext, b"second from peer");
    }

    #[test]
    fn undecryptable_envelopes_are_skipped_not_fatal() {
        let key = test_session_key();
        let mut bad = sealed_envelope(&key, PEER, 0, b"garbled", 1_000);
        bad.ciphertext[0] ^= 0xFF;

        let envelopes = vec![bad, sealed_envelope(&key, PEER, 1, b"intact", 2_000)];
        let seed = reconcile_history(&envelopes, &key, LOCAL);

        assert_eq!(seed.skipped, 1);
        assert_eq!(seed.transcript.len(), 1);
        assert_eq!(seed.transcript.entries()[0].plaintext, b"intact");
        assert_eq!(seed.max_received_seq, Some(1));
    }

    #[test]
    fn sent_only_history_leaves_recv_counter_untouched() {
        let key = test_session_key();
        let envelopes = vec![sealed_envelope(&key, LOCAL, 4, b"mine", 1_000)];

        let seed = reconcile_history(&envelopes, &key, LOCAL);
        assert_eq!(seed.max_received_seq, None);
    }

    #[test]
    fn empty_history_seeds_empty_transcript() {
        let key = test_session_key();
        let seed = reconcile_history(&[], &key, LOCAL);

        assert!(seed.transcript.is_empty());
        assert_eq!(seed.max_received_seq, None);
        assert_eq!(seed.skipped, 0);
    }
}
