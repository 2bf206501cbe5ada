//! Property-based tests for frame encoding/decoding.
//!
//! These tests verify that frame serialization is correct for ALL valid
//! inputs, not just specific examples. Uses proptest to generate arbitrary
//! frames and verify round-trip properties.

use bytes::Bytes;
use parley_proto::{Frame, FrameHeader, Opcode, Payload, payloads};
use proptest::prelude::*;

/// Strategy for generating arbitrary opcodes
fn arbitrary_opcode() -> impl Strategy<Value = Opcode> {
    prop_oneof![
        Just(Opcode::Join),
        Just(Opcode::KeyAnnounce),
        Just(Opcode::CipherMessage),
        Just(Opcode::Error),
    ]
}

/// Strategy for generating arbitrary frame headers
fn arbitrary_header() -> impl Strategy<Value = FrameHeader> {
    (
        arbitrary_opcode(),
        any::<u128>(), // conversation_id
        any::<u64>(),  // sender_id
        any::<u64>(),  // recipient_id
        any::<u64>(),  // timestamp_ms
    )
        .prop_map(|(opcode, conversation_id, sender_id, recipient_id, timestamp_ms)| {
            let mut header = FrameHeader::new(opcode);
            header.set_conversation_id(conversation_id);
            header.set_sender_id(sender_id);
            header.set_recipient_id(recipient_id);
            header.set_timestamp_ms(timestamp_ms);
            header
        })
}

/// Strategy for generating arbitrary frames with payloads
fn arbitrary_frame() -> impl Strategy<Value = Frame> {
    (
        arbitrary_header(),
        prop::collection::vec(any::<u8>(), 0..1024), // payload up to 1KB
    )
        .prop_map(|(header, payload)| Frame::new(header, Bytes::from(payload)))
}

#[test]
fn prop_frame_encode_decode_roundtrip() {
    proptest!(|(frame in arbitrary_frame())| {
        let mut buf = Vec::new();
        frame.encode(&mut buf).expect("encode should succeed");

        let decoded = Frame::decode(&buf).expect("decode should succeed");

        // PROPERTY: Round-trip must be identity
        prop_assert_eq!(decoded.header, frame.header, "Header mismatch after round-trip");
        prop_assert_eq!(decoded.payload, frame.payload, "Payload content mismatch");
    });
}

#[test]
fn prop_frame_header_roundtrip() {
    proptest!(|(header in arbitrary_header())| {
        let bytes = header.to_bytes();
        let decoded = FrameHeader::from_bytes(&bytes).expect("from_bytes should succeed");

        // PROPERTY: Header round-trip must be identity
        prop_assert_eq!(decoded.opcode(), header.opcode(), "Opcode mismatch");
        prop_assert_eq!(
            decoded.conversation_id(),
            header.conversation_id(),
            "Conversation ID mismatch"
        );
        prop_assert_eq!(decoded.sender_id(), header.sender_id(), "Sender ID mismatch");
        prop_assert_eq!(decoded.recipient_id(), header.recipient_id(), "Recipient ID mismatch");
        prop_assert_eq!(decoded.timestamp_ms(), header.timestamp_ms(), "Timestamp mismatch");
    });
}

#[test]
fn prop_frame_empty_payload() {
    proptest!(|(header in arbitrary_header())| {
        let frame = Frame::new(header, Bytes::new());

        let mut buf = Vec::new();
        frame.encode(&mut buf).expect("encode should succeed");

        let decoded = Frame::decode(&buf).expect("decode should succeed");

        // PROPERTY: Empty payload preserved
        prop_assert_eq!(decoded.payload.len(), 0, "Empty payload should remain empty");
        prop_assert_eq!(decoded.header.payload_size(), 0, "Header should show 0 payload");
    });
}

#[test]
fn prop_frame_encoded_size_correct() {
    proptest!(|(frame in arbitrary_frame())| {
        let mut buf = Vec::new();
        frame.encode(&mut buf).expect("encode should succeed");

        // PROPERTY: Encoded size must equal header size + payload size
        let expected_size = FrameHeader::SIZE + frame.payload.len();
        prop_assert_eq!(
            buf.len(),
            expected_size,
            "Encoded size mismatch: expected {}, got {}",
            expected_size,
            buf.len()
        );
    });
}

#[test]
fn prop_cipher_message_payload_roundtrip() {
    proptest!(|(
        seq in any::<u64>(),
        nonce in any::<[u8; 24]>(),
        ciphertext in prop::collection::vec(any::<u8>(), 0..512),
    )| {
        let payload = Payload::CipherMessage(payloads::app::CipherMessage {
            seq,
            nonce,
            ciphertext,
        });

        let frame = payload
            .clone()
            .into_frame(FrameHeader::new(Opcode::CipherMessage))
            .expect("should create frame");

        let mut wire = Vec::new();
        frame.encode(&mut wire).expect("encode should succeed");

        let parsed = Frame::decode(&wire).expect("decode should succeed");
        let decoded = Payload::from_frame(&parsed).expect("payload should parse");

        // PROPERTY: Payload survives frame + wire round-trip
        prop_assert_eq!(payload, decoded);
    });
}

#[test]
fn prop_truncation_always_rejected() {
    proptest!(|(frame in arbitrary_frame(), cut in 1usize..64)| {
        let mut buf = Vec::new();
        frame.encode(&mut buf).expect("encode should succeed");

        // Remove `cut` trailing bytes; a nonempty cut must fail decode.
        prop_assume!(cut <= buf.len());
        buf.truncate(buf.len() - cut);

        // PROPERTY: Truncated wire data never decodes successfully
        prop_assert!(Frame::decode(&buf).is_err());
    });
}
