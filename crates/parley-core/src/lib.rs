//! Parley Core
//!
//! Shared foundations for the Parley secure-session subsystem: the
//! environment abstraction (time, randomness), the capability-style
//! key/value store boundary, identity keypair persistence, the peer key
//! cache, and the history store boundary.
//!
//! Protocol logic never touches system resources directly. Everything
//! non-deterministic or external is injected: clocks and RNG through
//! [`env::Environment`], persistence through [`store::KeyStore`] and
//! [`history::HistoryStore`]. This keeps the session state machine
//! deterministic and lets tests substitute doubles for every boundary.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod env;
pub mod error;
pub mod history;
pub mod identity;
pub mod store;

pub use env::{Environment, ManualEnv, SystemEnv};
pub use error::StoreError;
pub use history::{HistoryStore, MemoryHistoryStore, StoredEnvelope};
pub use identity::{identity_store_key, load_or_create_identity, load_peer_key, peer_store_key, store_peer_key};
pub use store::{KeyStore, MemoryKeyStore};
