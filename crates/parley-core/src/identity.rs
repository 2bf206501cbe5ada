//! Identity keypair persistence and the peer key cache.
//!
//! Both are thin layers over the injected [`KeyStore`]: logical names
//! derived from user identity map to raw key material. Shared across
//! conversation views for the same user; append/overwrite-only.

use parley_crypto::{IdentityKeypair, PeerPublicKey};

use crate::{env::Environment, error::StoreError, store::KeyStore};

/// Logical store key for a user's identity keypair.
#[must_use]
pub fn identity_store_key(user_id: u64) -> String {
    format!("identity/{user_id}")
}

/// Logical store key for a cached peer public key.
#[must_use]
pub fn peer_store_key(peer_id: u64) -> String {
    format!("peer/{peer_id}")
}

/// Load the user's identity keypair, generating and persisting a fresh
/// one if none exists.
///
/// A well-formed stored entry is returned unchanged and never
/// overwritten. A malformed entry (wrong length, inconsistent halves) is
/// treated as absent and replaced - identity must be recoverable even if
/// the store was corrupted, because no chat is possible without it.
///
/// # Errors
///
/// - `StoreError::Unavailable` if the store cannot be reached. Fatal to
///   the conversation view.
pub fn load_or_create_identity<S: KeyStore, E: Environment>(
    store: &S,
    env: &E,
    user_id: u64,
) -> Result<IdentityKeypair, StoreError> {
    let key = identity_store_key(user_id);

    if let Some(bytes) = store.get(&key)? {
        if let Some(keypair) = IdentityKeypair::from_stored_bytes(&bytes) {
            return Ok(keypair);
        }
    }

    let mut secret_bytes = [0u8; 32];
    env.random_bytes(&mut secret_bytes);

    let keypair = IdentityKeypair::from_secret_bytes(secret_bytes);
    store.put(&key, &keypair.to_stored_bytes())?;

    Ok(keypair)
}

/// Load a cached peer public key. `None` if absent or malformed.
///
/// # Errors
///
/// - `StoreError::Unavailable` if the store cannot be reached.
pub fn load_peer_key<S: KeyStore>(
    store: &S,
    peer_id: u64,
) -> Result<Option<PeerPublicKey>, StoreError> {
    let Some(bytes) = store.get(&peer_store_key(peer_id))? else {
        return Ok(None);
    };

    let Ok(raw) = <[u8; 32]>::try_from(bytes.as_slice()) else {
        return Ok(None);
    };

    Ok(Some(PeerPublicKey::from(raw)))
}

/// Cache a peer public key, replacing any previous entry.
///
/// # Errors
///
/// - `StoreError::Unavailable` if the store cannot be reached.
pub fn store_peer_key<S: KeyStore>(
    store: &S,
    peer_id: u64,
    public_key: &PeerPublicKey,
) -> Result<(), StoreError> {
    store.put(&peer_store_key(peer_id), public_key.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{env::ManualEnv, store::MemoryKeyStore};

    #[test]
    fn creates_identity_on_first_load() {
        let store = MemoryKeyStore::new();
        let env = ManualEnv::new(1);

        assert!(store.is_empty());
        let keypair = load_or_create_identity(&store, &env, 7).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(
            store.get(&identity_store_key(7)).unwrap(),
            Some(keypair.to_stored_bytes().to_vec())
        );
    }

    #[test]
    fn second_load_returns_stored_keypair_unchanged() {
        let store = MemoryKeyStore::new();
        let env = ManualEnv::new(1);

        let first = load_or_create_identity(&store, &env, 7).unwrap();
        let second = load_or_create_identity(&store, &env, 7).unwrap();

        assert_eq!(first.to_stored_bytes(), second.to_stored_bytes());
    }

    #[test]
    fn distinct_users_get_distinct_identities() {
        let store = MemoryKeyStore::new();
        let env = ManualEnv::new(1);

        let alice = load_or_create_identity(&store, &env, 1).unwrap();
        let bob = load_or_create_identity(&store, &env, 2).unwrap();

        assert_ne!(alice.public_bytes(), bob.public_bytes());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn corrupt_entry_is_regenerated() {
        let store = MemoryKeyStore::new();
        let env = ManualEnv::new(1);

        store.put(&identity_store_key(7), &[0xFF; 10]).unwrap();

        let keypair = load_or_create_identity(&store, &env, 7).unwrap();
        assert_eq!(
            store.get(&identity_store_key(7)).unwrap(),
            Some(keypair.to_stored_bytes().to_vec())
        );
    }

    #[test]
    fn peer_key_cache_round_trips() {
        let store = MemoryKeyStore::new();

        assert_eq!(load_peer_key(&store, 9).unwrap(), None);

        let peer = IdentityKeypair::from_secret_bytes([5; 32]);
        store_peer_key(&store, 9, peer.public()).unwrap();

        let cached = load_peer_key(&store, 9).unwrap().expect("cached key");
        assert_eq!(cached.as_bytes(), peer.public().as_bytes());
    }

    #[test]
    fn malformed_peer_entry_reads_as_absent() {
        let store = MemoryKeyStore::new();
        store.put(&peer_store_key(9), &[1, 2, 3]).unwrap();

        assert_eq!(load_peer_key(&store, 9).unwrap(), None);
    }
}
