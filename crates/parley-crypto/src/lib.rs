//! Parley Cryptographic Primitives
//!
//! Cryptographic building blocks for Parley. Pure functions with
//! deterministic outputs. Callers provide random bytes for deterministic
//! testing.
//!
//! # Key Lifecycle
//!
//! Each party holds a long-term X25519 identity keypair. When two parties
//! open a conversation they exchange public keys through the relay and
//! each side derives the same symmetric session key without a trusted
//! third party:
//!
//! ```text
//! Identity Keypair (X25519, long-term)
//!        │
//!        ▼
//! Diffie-Hellman → Shared Secret (per peer)
//!        │
//!        ▼
//! HKDF-SHA256 → Session Key (32 bytes, volatile)
//!        │
//!        ▼
//! XChaCha20-Poly1305 → Ciphertext (seq bound as associated data)
//! ```
//!
//! The session key lives only in memory for the lifetime of one
//! conversation view and is zeroized on drop.
//!
//! # Security
//!
//! Authenticity:
//! - XChaCha20-Poly1305 AEAD provides tamper-proof encryption
//! - The message sequence number is bound into the authentication tag as
//!   associated data; re-labeling a ciphertext with a different sequence
//!   number fails authentication
//! - Failed authentication tag -> reject message
//!
//! Nonce discipline:
//! - 24-byte random nonce per encryption; the extended nonce size makes
//!   random generation collision-safe under a single key
//! - A (session key, seq) pair is never reused for encryption
//!
//! Key agreement:
//! - `derive(a.secret, b.public)` and `derive(b.secret, a.public)` are
//!   byte-identical; this symmetry replaces a trusted key-exchange server

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod codec;
mod error;
mod identity;
mod session;

pub use codec::{NONCE_SIZE, SealedMessage, open_message, seal_message};
pub use error::CryptoError;
pub use identity::{IDENTITY_STORED_SIZE, IdentityKeypair, PeerPublicKey};
pub use session::{SESSION_KEY_SIZE, SessionKey, derive_session_key};
