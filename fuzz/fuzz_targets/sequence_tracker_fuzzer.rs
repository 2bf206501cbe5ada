//! Fuzz target for SequenceTracker invariants
//!
//! Feeds arbitrary interleavings of send assignments and receive
//! attempts into the tracker and asserts the anti-replay invariants:
//! - send_seq is strictly increasing, one value per assignment
//! - recv_seq never decreases
//! - an accepted seq is strictly greater than every previously accepted
//!   one from the expected peer

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use parley_client::SequenceTracker;

#[derive(Arbitrary, Debug)]
enum Op {
    NextSend,
    Accept { sender_id: u64, seq: u64 },
    Seed { seq: u64 },
}

fuzz_target!(|ops: Vec<Op>| {
    const PEER: u64 = 7;
    let mut tracker = SequenceTracker::new(PEER);
    let mut last_send: Option<u64> = None;

    for op in ops {
        let recv_before = tracker.recv_seq();

        match op {
            Op::NextSend => {
                let seq = tracker.next_send_seq();
                assert!(last_send.is_none_or(|prev| seq == prev + 1));
                last_send = Some(seq);
            }
            Op::Accept { sender_id, seq } => {
                let accepted = tracker.accept_received(sender_id, seq);
                if accepted {
                    assert_eq!(sender_id, PEER);
                    assert!(recv_before.is_none_or(|highest| seq > highest));
                    assert_eq!(tracker.recv_seq(), Some(seq));
                } else {
                    assert_eq!(tracker.recv_seq(), recv_before);
                }
            }
            Op::Seed { seq } => {
                tracker.seed_recv(seq);
                let expected = recv_before.map_or(seq, |highest| highest.max(seq));
                assert_eq!(tracker.recv_seq(), Some(expected));
            }
        }

        // recv_seq never decreases
        assert!(tracker.recv_seq() >= recv_before);
    }
});
