//! Frame header implementation with zero-copy parsing.
//!
//! The `FrameHeader` is a fixed 64-byte structure serialized as raw binary
//! (Big Endian). The relay makes all routing decisions from this header
//! without deserializing the payload.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::{
    Opcode,
    errors::{ProtocolError, Result},
};

/// Fixed 64-byte frame header (Big Endian network byte order).
///
/// Fields are stored as raw byte arrays to avoid alignment issues; all
/// multi-byte integers are Big Endian. The header fits one 64-byte CPU
/// cache line, so relay routing touches a single line per frame.
///
/// # Security
///
/// The `#[repr(C, packed)]` layout with zerocopy traits ensures this
/// struct can be safely cast from untrusted network bytes - every 64-byte
/// pattern is a valid bit pattern, so casting cannot cause undefined
/// behavior. Structural validity (magic, version, size limits) is checked
/// in [`FrameHeader::from_bytes`]; the header is NOT authenticated at
/// this layer. Message authenticity comes from the AEAD tag over the
/// payload, verified by the session layer.
#[repr(C, packed)]
#[derive(Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct FrameHeader {
    // Protocol identification (8 bytes: 0-7)
    magic: [u8; 4],             // 0x50524C59 ("PRLY" in ASCII)
    version: u8,                // 0x01
    reserved: u8,               // must be zero
    pub(crate) opcode: [u8; 2], // u16 operation code

    // Payload metadata (4 bytes: 8-11)
    pub(crate) payload_size: [u8; 4], // u32 payload length

    // Routing context (32 bytes: 12-43)
    conversation_id: [u8; 16], // UUID (128-bit)
    sender_id: [u8; 8],        // u64 sender identifier
    recipient_id: [u8; 8],     // u64 addressed recipient

    // Ordering context (8 bytes: 44-51)
    timestamp_ms: [u8; 8], // u64 Unix milliseconds, sender-assigned

    // Reserved for future use (12 bytes: 52-63)
    reserved2: [u8; 12],
}

impl FrameHeader {
    /// Size of the serialized header (64 bytes).
    pub const SIZE: usize = 64;

    /// Magic number: "PRLY" in ASCII (0x50524C59).
    pub const MAGIC: u32 = 0x5052_4C59;

    /// Current protocol version.
    pub const VERSION: u8 = 0x01;

    /// Maximum payload size (1 MiB).
    ///
    /// Two-party chat messages are small; this bound exists to reject
    /// memory-exhaustion frames from a hostile relay before allocation.
    pub const MAX_PAYLOAD_SIZE: u32 = 1024 * 1024;

    /// Create a new header with the specified opcode.
    ///
    /// All routing fields start at zero; use the setters before encoding.
    #[must_use]
    pub fn new(opcode: Opcode) -> Self {
        Self {
            magic: Self::MAGIC.to_be_bytes(),
            version: Self::VERSION,
            reserved: 0,
            opcode: opcode.to_u16().to_be_bytes(),
            payload_size: [0; 4],
            conversation_id: [0; 16],
            sender_id: [0; 8],
            recipient_id: [0; 8],
            timestamp_ms: [0; 8],
            reserved2: [0; 12],
        }
    }

    /// Parse a header from network bytes (zero-copy, safe).
    ///
    /// Casts raw bytes directly to a `FrameHeader` reference using
    /// compile-time layout verification from `zerocopy`. No data is
    /// copied.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::FrameTooShort` if the buffer holds fewer than 64
    ///   bytes
    /// - `ProtocolError::InvalidMagic` if the magic number is wrong
    /// - `ProtocolError::UnsupportedVersion` for unknown versions
    /// - `ProtocolError::PayloadTooLarge` if the claimed payload size
    ///   exceeds the maximum
    pub fn from_bytes(bytes: &[u8]) -> Result<&Self> {
        let header = Self::ref_from_prefix(bytes)
            .map_err(|_| ProtocolError::FrameTooShort {
                expected: Self::SIZE,
                actual: bytes.len(),
            })?
            .0;

        if u32::from_be_bytes(header.magic) != Self::MAGIC {
            return Err(ProtocolError::InvalidMagic);
        }

        if header.version != Self::VERSION {
            return Err(ProtocolError::UnsupportedVersion(header.version));
        }

        let payload_size = u32::from_be_bytes(header.payload_size);
        if payload_size > Self::MAX_PAYLOAD_SIZE {
            return Err(ProtocolError::PayloadTooLarge {
                size: payload_size as usize,
                max: Self::MAX_PAYLOAD_SIZE as usize,
            });
        }

        Ok(header)
    }

    /// Serialize the header to bytes.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let bytes = IntoBytes::as_bytes(self);
        let mut arr = [0u8; Self::SIZE];
        arr.copy_from_slice(bytes);
        arr
    }

    /// Operation code as raw u16.
    #[must_use]
    pub fn opcode(&self) -> u16 {
        u16::from_be_bytes(self.opcode)
    }

    /// Operation code as enum. `None` if unrecognized.
    #[must_use]
    pub fn opcode_enum(&self) -> Option<Opcode> {
        Opcode::from_u16(self.opcode())
    }

    /// Payload length claimed by this header.
    #[must_use]
    pub fn payload_size(&self) -> u32 {
        u32::from_be_bytes(self.payload_size)
    }

    /// 128-bit conversation UUID.
    #[must_use]
    pub fn conversation_id(&self) -> u128 {
        u128::from_be_bytes(self.conversation_id)
    }

    /// Set the conversation UUID.
    pub fn set_conversation_id(&mut self, conversation_id: u128) {
        self.conversation_id = conversation_id.to_be_bytes();
    }

    /// Stable sender identifier.
    #[must_use]
    pub fn sender_id(&self) -> u64 {
        u64::from_be_bytes(self.sender_id)
    }

    /// Set the sender identifier.
    pub fn set_sender_id(&mut self, sender_id: u64) {
        self.sender_id = sender_id.to_be_bytes();
    }

    /// Addressed recipient identifier.
    #[must_use]
    pub fn recipient_id(&self) -> u64 {
        u64::from_be_bytes(self.recipient_id)
    }

    /// Set the recipient identifier.
    pub fn set_recipient_id(&mut self, recipient_id: u64) {
        self.recipient_id = recipient_id.to_be_bytes();
    }

    /// Sender-assigned timestamp in Unix milliseconds.
    #[must_use]
    pub fn timestamp_ms(&self) -> u64 {
        u64::from_be_bytes(self.timestamp_ms)
    }

    /// Set the timestamp in Unix milliseconds.
    pub fn set_timestamp_ms(&mut self, timestamp_ms: u64) {
        self.timestamp_ms = timestamp_ms.to_be_bytes();
    }
}

impl std::fmt::Debug for FrameHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameHeader")
            .field("opcode", &format_args!("{:#06x}", self.opcode()))
            .field("payload_size", &self.payload_size())
            .field("conversation_id", &format_args!("{:#034x}", self.conversation_id()))
            .field("sender_id", &self.sender_id())
            .field("recipient_id", &self.recipient_id())
            .field("timestamp_ms", &self.timestamp_ms())
            .finish_non_exhaustive()
    }
}

impl PartialEq for FrameHeader {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for FrameHeader {}
