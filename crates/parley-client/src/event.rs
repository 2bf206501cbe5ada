//! Session events and actions.

use parley_core::history::StoredEnvelope;
use parley_proto::Frame;

use crate::transcript::TranscriptEntry;

/// Events the caller feeds into the session.
///
/// The caller is responsible for:
/// - Receiving frames from the relay connection
/// - Fetching history from the history store
/// - Forwarding application intents (send message, close)
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The relay connection is up; join the conversation and announce
    /// our public key.
    Connected,

    /// Frame received from the relay.
    FrameReceived(Frame),

    /// Application wants to send a message.
    SendMessage {
        /// Message plaintext.
        plaintext: Vec<u8>,
    },

    /// History fetch completed.
    ///
    /// An empty vector is the explicit "no history / skip" signal; live
    /// messages are held back until this event arrives either way.
    HistoryLoaded {
        /// Sealed envelopes from the history store, in storage order.
        envelopes: Vec<StoredEnvelope>,
    },

    /// The conversation view is being abandoned.
    ///
    /// Every event after this one is discarded, including in-flight
    /// history fetches that complete late.
    Close,
}

/// Actions the session produces for the caller to execute.
#[derive(Debug, Clone)]
pub enum SessionAction {
    /// Send a frame to the relay.
    Send(Frame),

    /// Cache the peer's public key in the key store.
    ///
    /// The caller decides the storage backend; the session never touches
    /// the store directly.
    PersistPeerKey {
        /// Peer whose key was announced.
        peer_id: u64,
        /// The announced X25519 public key.
        public_key: [u8; 32],
    },

    /// The session key is derived; sending and receiving is now
    /// possible.
    SessionReady,

    /// One entry was appended to the transcript.
    ///
    /// Emitted for the optimistic local echo of sent messages and for
    /// every accepted live message.
    TranscriptAppended(TranscriptEntry),

    /// History reconciliation completed.
    HistoryReconciled {
        /// Envelopes successfully decrypted into the transcript.
        loaded: usize,
        /// Envelopes skipped because they failed to decrypt.
        skipped: usize,
    },

    /// Diagnostic log message.
    Log {
        /// Log message.
        message: String,
    },
}
