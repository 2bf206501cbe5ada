//! CBOR-encoded protocol messages.
//!
//! Frame headers are raw binary for routing speed, but payloads use CBOR
//! for type safety and forward compatibility. CBOR is self-describing
//! (field names embedded), compact, and needs no code generation. The
//! relay never deserializes payloads - only clients do.
//!
//! # Invariants
//!
//! Each payload variant maps to exactly one opcode (enforced by match
//! exhaustiveness). Round-trip encoding must produce identical values.

pub mod app;
pub mod handshake;

use bytes::BufMut;
use serde::{Deserialize, Serialize};

use crate::{
    Frame, FrameHeader, Opcode,
    errors::{ProtocolError, Result},
};

/// All possible frame payloads.
///
/// The payload type is determined by the `Opcode` in the frame header, so
/// only the inner struct content is serialized (no variant tag in CBOR).
/// An attacker therefore cannot send mismatched opcode/payload pairs: the
/// opcode alone decides how bytes are interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Subscribe to a conversation (header-only, zero-byte payload).
    Join,

    /// Addressed public key announcement.
    KeyAnnounce(handshake::KeyAnnounce),

    /// One encrypted message.
    CipherMessage(app::CipherMessage),

    /// Relay-reported failure.
    Error(ErrorPayload),
}

/// Error payload for error frames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Error code identifying the type of error.
    pub code: u16,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorPayload {
    /// Frame was rejected by the relay.
    pub const FRAME_REJECTED: u16 = 0x0001;
    /// Conversation does not exist or is not joined.
    pub const CONVERSATION_NOT_FOUND: u16 = 0x0002;
    /// Addressed recipient is unknown to the relay.
    pub const RECIPIENT_UNKNOWN: u16 = 0x0003;

    /// Create a frame rejection error.
    pub fn frame_rejected(reason: impl Into<String>) -> Self {
        Self { code: Self::FRAME_REJECTED, message: reason.into() }
    }

    /// Create a conversation not found error.
    #[must_use]
    pub fn conversation_not_found(conversation_id: u128) -> Self {
        Self {
            code: Self::CONVERSATION_NOT_FOUND,
            message: format!("conversation not found: {conversation_id:032x}"),
        }
    }

    /// Create a recipient unknown error.
    #[must_use]
    pub fn recipient_unknown(user_id: u64) -> Self {
        Self { code: Self::RECIPIENT_UNKNOWN, message: format!("unknown recipient: {user_id}") }
    }
}

impl Payload {
    /// Opcode corresponding to this payload type.
    #[must_use]
    pub const fn opcode(&self) -> Opcode {
        match self {
            Self::Join => Opcode::Join,
            Self::KeyAnnounce(_) => Opcode::KeyAnnounce,
            Self::CipherMessage(_) => Opcode::CipherMessage,
            Self::Error(_) => Opcode::Error,
        }
    }

    /// Encode the payload into a buffer.
    ///
    /// Serializes only the inner struct, NOT the variant tag: the frame
    /// header's opcode already identifies the payload type.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::CborEncode` if serialization fails
    pub fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        let mut writer = dst.writer();

        match self {
            Self::Join => Ok(()), // Zero-byte payload
            Self::KeyAnnounce(inner) => ciborium::ser::into_writer(inner, &mut writer),
            Self::CipherMessage(inner) => ciborium::ser::into_writer(inner, &mut writer),
            Self::Error(inner) => ciborium::ser::into_writer(inner, &mut writer),
        }
        .map_err(|e| ProtocolError::CborEncode(e.to_string()))
    }

    /// Decode a payload from bytes based on the opcode.
    ///
    /// The size check happens BEFORE CBOR parsing begins, so the parser
    /// never processes maliciously large inputs.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::PayloadTooLarge` if bytes exceed the maximum
    /// - `ProtocolError::CborDecode` if deserialization fails
    pub fn decode(opcode: Opcode, bytes: &[u8]) -> Result<Self> {
        if bytes.len() > FrameHeader::MAX_PAYLOAD_SIZE as usize {
            return Err(ProtocolError::PayloadTooLarge {
                size: bytes.len(),
                max: FrameHeader::MAX_PAYLOAD_SIZE as usize,
            });
        }

        let payload = match opcode {
            Opcode::Join => Self::Join,
            Opcode::KeyAnnounce => Self::KeyAnnounce(
                ciborium::de::from_reader(bytes)
                    .map_err(|e| ProtocolError::CborDecode(e.to_string()))?,
            ),
            Opcode::CipherMessage => Self::CipherMessage(
                ciborium::de::from_reader(bytes)
                    .map_err(|e| ProtocolError::CborDecode(e.to_string()))?,
            ),
            Opcode::Error => Self::Error(
                ciborium::de::from_reader(bytes)
                    .map_err(|e| ProtocolError::CborDecode(e.to_string()))?,
            ),
        };

        Ok(payload)
    }

    /// Convert the payload into a transport frame.
    ///
    /// Encodes the payload to CBOR, sets the matching opcode in the
    /// header, and computes `payload_size` automatically.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::CborEncode` if serialization fails
    pub fn into_frame(self, mut header: FrameHeader) -> Result<Frame> {
        let mut buf = Vec::new();
        self.encode(&mut buf)?;
        header.opcode = self.opcode().to_u16().to_be_bytes();
        Ok(Frame::new(header, buf))
    }

    /// Parse a payload from a raw transport frame.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::UnknownOpcode` if the header opcode is
    ///   unrecognized
    /// - `ProtocolError::CborDecode` if deserialization fails
    /// - `ProtocolError::PayloadTooLarge` if the payload exceeds the
    ///   maximum
    pub fn from_frame(frame: &Frame) -> Result<Self> {
        let opcode = frame
            .header
            .opcode_enum()
            .ok_or(ProtocolError::UnknownOpcode(frame.header.opcode()))?;
        Self::decode(opcode, &frame.payload)
    }
}
