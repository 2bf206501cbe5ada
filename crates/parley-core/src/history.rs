//! History store boundary.
//!
//! The relay (or an adjacent service) persists sealed envelopes so a
//! party can rebuild its transcript after reopening a conversation. The
//! store is read-only from the session's point of view and never sees
//! plaintext - envelopes are stored exactly as they crossed the wire.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// One sealed envelope as persisted by the history store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEnvelope {
    /// Stable sender identifier.
    pub sender_id: u64,

    /// Sender-assigned sequence number.
    pub seq: u64,

    /// The 24-byte XChaCha20 nonce used at sealing time.
    pub nonce: [u8; 24],

    /// Ciphertext including the Poly1305 authentication tag.
    pub ciphertext: Vec<u8>,

    /// Store-assigned timestamp in Unix milliseconds.
    pub timestamp_ms: u64,
}

/// Read-only access to a conversation's persisted envelopes.
///
/// Synchronous for the same reason as [`crate::store::KeyStore`];
/// implementations fetch and buffer as they see fit.
pub trait HistoryStore: Clone + Send + Sync + 'static {
    /// All stored envelopes for a conversation, in storage order.
    ///
    /// # Errors
    ///
    /// - `StoreError::Unavailable` if the store cannot be reached.
    fn fetch_history(&self, conversation_id: u128) -> Result<Vec<StoredEnvelope>, StoreError>;
}

/// In-memory history store for testing and simulation.
#[derive(Clone, Default)]
pub struct MemoryHistoryStore {
    envelopes: Arc<Mutex<HashMap<u128, Vec<StoredEnvelope>>>>,
}

impl MemoryHistoryStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an envelope to a conversation's log.
    pub fn push(&self, conversation_id: u128, envelope: StoredEnvelope) {
        self.envelopes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(conversation_id)
            .or_default()
            .push(envelope);
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn fetch_history(&self, conversation_id: u128) -> Result<Vec<StoredEnvelope>, StoreError> {
        Ok(self
            .envelopes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&conversation_id)
            .cloned()
            .unwrap_or_default())
    }
}
