//! Parley Wire Format
//!
//! Transport-layer framing for the Parley relay protocol. A frame is a
//! fixed 64-byte raw binary header (Big Endian) followed by a
//! variable-length CBOR payload. The relay routes frames on header fields
//! alone and never deserializes payloads - only clients do.
//!
//! The header carries addressing (conversation, sender, recipient) and a
//! wall-clock timestamp; the payload carries the opcode-specific content
//! (key announcements, encrypted messages). Payload plaintext is never
//! visible at this layer: encrypted messages arrive here already sealed.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod errors;
mod frame;
mod header;
mod opcode;
pub mod payloads;

pub use errors::{ProtocolError, Result};
pub use frame::Frame;
pub use header::FrameHeader;
pub use opcode::Opcode;
pub use payloads::Payload;
