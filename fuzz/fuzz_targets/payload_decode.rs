//! Fuzz target for Payload::from_frame
//!
//! This fuzzer tests payload deserialization (CBOR decoding) with:
//! - Malformed CBOR data
//! - Type confusion attacks (wrong payload type for opcode)
//! - Oversized strings or collections
//!
//! The fuzzer should NEVER panic. All invalid inputs should return an error.

#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use parley_proto::{Frame, FrameHeader, Opcode, Payload};

fuzz_target!(|data: &[u8]| {
    // We need a valid frame header to test payload decoding
    // Try all opcodes to test different payload types
    let opcodes = [Opcode::Join, Opcode::KeyAnnounce, Opcode::CipherMessage, Opcode::Error];

    for opcode in opcodes {
        let mut header = FrameHeader::new(opcode);
        header.set_conversation_id(1);
        header.set_sender_id(1);
        header.set_recipient_id(2);

        let frame = Frame::new(header, Bytes::copy_from_slice(data));

        // Attempt to deserialize the payload
        // This should never panic, only return Err for invalid CBOR
        let _ = Payload::from_frame(&frame);
    }
});
