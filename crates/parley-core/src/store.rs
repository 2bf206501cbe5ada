//! Key/value store abstraction for identity and peer key persistence.
//!
//! Trait-based abstraction over the external keyed store (disk, browser
//! storage, database). The trait is synchronous (no async) to maintain a
//! clean synchronous API design; implementations backed by slow media can
//! cache or spool internally.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use crate::error::StoreError;

/// Keyed byte store with last-write-wins semantics.
///
/// Must be Clone (shared across conversation views for the same user),
/// Send + Sync, and synchronous. Implementations typically share internal
/// state via Arc, so clones access the same underlying storage. No
/// transactional guarantees beyond last-write-wins.
pub trait KeyStore: Clone + Send + Sync + 'static {
    /// Fetch the bytes stored under `key`. `None` if absent.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Store `value` under `key`, replacing any existing entry.
    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;
}

/// In-memory store implementation for testing and simulation.
///
/// All state is wrapped in `Arc<Mutex<_>>` so clones share one underlying
/// map, mirroring how real conversation views share one backing store.
#[derive(Clone, Default)]
pub struct MemoryKeyStore {
    entries: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryKeyStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries. Useful for tests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyStore for MemoryKeyStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.lock().unwrap_or_else(PoisonError::into_inner).get(key).cloned())
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }
}
