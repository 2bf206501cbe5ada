//! Frame type combining header and payload.
//!
//! A `Frame` is the transport-layer packet: a 64-byte raw binary header
//! followed by already-encoded payload bytes. This is a pure data holder;
//! for high-level logic see `Payload::into_frame()` and
//! `Payload::from_frame()`.

use bytes::{BufMut, Bytes};

use crate::{
    FrameHeader,
    errors::{ProtocolError, Result},
};

/// Complete protocol frame (transport layer).
///
/// Layout on the wire:
/// `[FrameHeader: 64 bytes, raw binary] + [payload: variable bytes]`
///
/// Holds raw bytes, NOT the `Payload` enum: the relay routes frames
/// without deserializing payloads.
///
/// # Invariants
///
/// - `payload.len()` MUST match `header.payload_size()`. Enforced by
///   [`Frame::new`] and verified by [`Frame::decode`].
/// - `payload.len()` MUST NOT exceed [`FrameHeader::MAX_PAYLOAD_SIZE`].
///   Violations are rejected during encoding and decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Frame header (64 bytes).
    pub header: FrameHeader,

    /// Raw payload bytes (already CBOR-encoded).
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame with automatic `payload_size` calculation.
    ///
    /// The header's `payload_size` field is set to the actual payload
    /// length, so a `Frame` can never carry a mismatched size claim.
    #[must_use]
    pub fn new(mut header: FrameHeader, payload: impl Into<Bytes>) -> Self {
        let payload = payload.into();

        // INVARIANT: Bytes is bounded by isize::MAX and the protocol limit
        // (1 MiB) is far below u32::MAX, so the length always fits.
        #[allow(clippy::expect_used)]
        let payload_len = u32::try_from(payload.len())
            .expect("invariant: payload length fits in u32 (bounded by protocol limit)");

        header.payload_size = payload_len.to_be_bytes();

        Self { header, payload }
    }

    /// Encode the frame into a buffer.
    ///
    /// Writes `[header (64 bytes)] + [payload (variable)]`.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::PayloadTooLarge` if the payload exceeds
    ///   [`FrameHeader::MAX_PAYLOAD_SIZE`]
    pub fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        debug_assert_eq!(self.payload.len(), self.header.payload_size() as usize);

        if self.payload.len() > FrameHeader::MAX_PAYLOAD_SIZE as usize {
            return Err(ProtocolError::PayloadTooLarge {
                size: self.payload.len(),
                max: FrameHeader::MAX_PAYLOAD_SIZE as usize,
            });
        }

        dst.put_slice(&self.header.to_bytes());
        dst.put_slice(&self.payload);

        Ok(())
    }

    /// Decode a frame from wire format.
    ///
    /// Returns a `Frame` with raw payload bytes (does NOT parse CBOR).
    /// Use `Payload::from_frame()` for the high-level enum. All header
    /// validation happens before payload memory is allocated, and exactly
    /// `payload_size` bytes are read - trailing data is ignored.
    ///
    /// # Errors
    ///
    /// - `ProtocolError` if header parsing fails (magic, version, size)
    /// - `ProtocolError::FrameTruncated` if the buffer holds fewer payload
    ///   bytes than the header claims
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let header = FrameHeader::from_bytes(bytes)?;

        let payload_size = header.payload_size() as usize;
        let total_size = FrameHeader::SIZE + payload_size;

        if bytes.len() < total_size {
            return Err(ProtocolError::FrameTruncated {
                expected: payload_size,
                actual: bytes.len().saturating_sub(FrameHeader::SIZE),
            });
        }

        // INVARIANT: bytes.len() >= total_size was verified above, so the
        // slice bounds cannot panic.
        #[allow(clippy::expect_used)]
        let payload = Bytes::copy_from_slice(
            bytes.get(FrameHeader::SIZE..total_size).expect("invariant: bounds checked above"),
        );

        Ok(Self { header: *header, payload })
    }
}
