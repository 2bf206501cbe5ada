//! Sequence tracking and anti-replay policy.
//!
//! Each conversation keeps two independent monotonic counters: the next
//! sequence number to assign to an outgoing message, and the highest
//! sequence number accepted from the peer. The two directions never
//! interact - each party tracks only what it sends and what it accepts.

/// Monotonic send/receive counters for one conversation.
///
/// # Invariants
///
/// - `send_seq` is strictly increasing; one value per transmitted message
/// - `recv_seq` only ever rises; `None` means "nothing accepted yet"
/// - Acceptance is strictly-increasing but not gapless: a skipped
///   sequence number is gone from the live stream for good (it may still
///   surface via history reconciliation)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceTracker {
    /// Expected peer for this conversation.
    peer_id: u64,

    /// Next sequence number to assign to an outgoing message.
    send_seq: u64,

    /// Highest sequence number accepted from the peer. `None` until the
    /// first acceptance.
    recv_seq: Option<u64>,
}

impl SequenceTracker {
    /// Create a tracker for a conversation with the given peer.
    #[must_use]
    pub fn new(peer_id: u64) -> Self {
        Self { peer_id, send_seq: 0, recv_seq: None }
    }

    /// Next outgoing sequence number without consuming it.
    #[must_use]
    pub fn send_seq(&self) -> u64 {
        self.send_seq
    }

    /// Highest accepted incoming sequence number, if any.
    #[must_use]
    pub fn recv_seq(&self) -> Option<u64> {
        self.recv_seq
    }

    /// Assign the next outgoing sequence number.
    ///
    /// Returns the current value, then increments. Call exactly once per
    /// message actually transmitted - never for sends that were rejected.
    pub fn next_send_seq(&mut self) -> u64 {
        let seq = self.send_seq;
        self.send_seq += 1;
        seq
    }

    /// Whether an incoming message would pass the anti-replay check,
    /// without advancing state.
    ///
    /// Used to reject replays and reorders before paying for decryption;
    /// the advance itself is committed by [`Self::accept_received`] only
    /// after the message authenticates.
    #[must_use]
    pub fn would_accept(&self, sender_id: u64, seq: u64) -> bool {
        if sender_id != self.peer_id {
            return false;
        }
        match self.recv_seq {
            Some(highest) => seq > highest,
            None => true,
        }
    }

    /// Accept an incoming sequence number, advancing `recv_seq`.
    ///
    /// Returns `false` (reject) if the sender is not the expected peer or
    /// `seq` is not strictly greater than the highest accepted so far.
    /// Duplicates and reorderings are dropped, not buffered.
    pub fn accept_received(&mut self, sender_id: u64, seq: u64) -> bool {
        if !self.would_accept(sender_id, seq) {
            return false;
        }
        self.recv_seq = Some(seq);
        true
    }

    /// Raise `recv_seq` to at least `seq` after history reconciliation.
    ///
    /// Never lowers the counter, so live-stream anti-replay continues
    /// seamlessly from where history left off.
    pub fn seed_recv(&mut self, seq: u64) {
        if self.recv_seq.is_none_or(|highest| seq > highest) {
            self.recv_seq = Some(seq);
        }
    }
}
