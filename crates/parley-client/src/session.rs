//! Conversation session state machine.
//!
//! One `Session` instance owns one (local user, peer, conversation)
//! view: the handshake, the session key, the sequence counters, and the
//! transcript. It is sans-IO - events in, actions out - so the caller
//! executes every network send, store write, and history fetch.

use std::time::Duration;

use parley_core::{env::Environment, history::StoredEnvelope};
use parley_crypto::{
    IdentityKeypair, NONCE_SIZE, PeerPublicKey, SealedMessage, SessionKey, derive_session_key,
    open_message, seal_message,
};
use parley_proto::{
    Frame, FrameHeader, Opcode, Payload,
    payloads::{app::CipherMessage, handshake::KeyAnnounce},
};

use crate::{
    error::SessionError,
    event::{SessionAction, SessionEvent},
    sequence::SequenceTracker,
    transcript::{Direction, Transcript, TranscriptEntry, reconcile_history},
};

/// Minimum gap between two announcements of the local public key.
///
/// Both parties may announce simultaneously when joining; answering every
/// announcement with a re-announcement would storm. The cooldown
/// guarantees the peer eventually receives our key (its first copy may
/// have been sent before the peer joined the room) while bounding
/// re-announcement traffic.
const REANNOUNCE_COOLDOWN: Duration = Duration::from_secs(1);

/// Identity of one conversation view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Local user's stable identifier.
    pub local_id: u64,

    /// Expected peer's stable identifier.
    pub peer_id: u64,

    /// Conversation UUID.
    pub conversation_id: u128,
}

/// Handshake progress for one conversation view.
///
/// Transitions only move forward: once the session key is derived it
/// remains valid for the lifetime of the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    /// No peer key known and nothing announced yet.
    NoPeerKey,

    /// Our key is announced; waiting for the peer's.
    KeyExchangePending,

    /// Session key derived; sending and receiving possible.
    SessionReady,
}

/// Per-conversation session state machine.
///
/// # Invariants
///
/// - The session key, once derived, never changes for this view
/// - `recv_seq` is consulted for live acceptance only after history
///   reconciliation completed (live messages queue until then)
/// - After [`SessionEvent::Close`] no event mutates state
pub struct Session<E: Environment> {
    /// Environment for randomness and timing.
    env: E,

    /// Who we are, who we talk to, where.
    config: SessionConfig,

    /// Local long-term identity keypair.
    keypair: IdentityKeypair,

    /// Handshake progress.
    state: HandshakeState,

    /// The peer's public key, once known.
    peer_key: Option<PeerPublicKey>,

    /// Derived session key, once both keys are known.
    session_key: Option<SessionKey>,

    /// When we last announced our public key.
    last_announce: Option<E::Instant>,

    /// Send/receive sequence counters and anti-replay policy.
    tracker: SequenceTracker,

    /// Time-ordered decrypted view.
    transcript: Transcript,

    /// Whether history reconciliation completed (or was explicitly
    /// skipped with an empty load).
    history_seeded: bool,

    /// Live messages held back until history reconciliation completes.
    pending_live: Vec<(u64, CipherMessage)>,

    /// Liveness flag; set by [`SessionEvent::Close`].
    closed: bool,
}

impl<E: Environment> Session<E> {
    /// Create a session for one conversation view.
    ///
    /// If the peer's public key was previously cached, the session key is
    /// derived immediately and the view starts in
    /// [`HandshakeState::SessionReady`] without waiting for a fresh
    /// announcement.
    #[must_use]
    pub fn new(
        env: E,
        config: SessionConfig,
        keypair: IdentityKeypair,
        cached_peer_key: Option<PeerPublicKey>,
    ) -> Self {
        let (state, peer_key, session_key) = match cached_peer_key {
            Some(peer_public) => {
                let key = derive_session_key(keypair.secret(), &peer_public);
                (HandshakeState::SessionReady, Some(peer_public), Some(key))
            },
            None => (HandshakeState::NoPeerKey, None, None),
        };

        Self {
            env,
            tracker: SequenceTracker::new(config.peer_id),
            config,
            keypair,
            state,
            peer_key,
            session_key,
            last_announce: None,
            transcript: Transcript::new(),
            history_seeded: false,
            pending_live: Vec::new(),
            closed: false,
        }
    }

    /// Current handshake state.
    #[must_use]
    pub fn handshake_state(&self) -> HandshakeState {
        self.state
    }

    /// Whether the session key is derived.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state == HandshakeState::SessionReady
    }

    /// Whether the view was closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// The time-ordered decrypted transcript.
    #[must_use]
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// The sequence counters for this view.
    #[must_use]
    pub fn sequence_tracker(&self) -> &SequenceTracker {
        &self.tracker
    }

    /// Process an event and return resulting actions.
    ///
    /// After [`SessionEvent::Close`] every event - including an in-flight
    /// history fetch completing late - is discarded without touching
    /// state.
    ///
    /// # Errors
    ///
    /// - `SessionError::SendWithoutSession` if a send was attempted
    ///   before the session key exists
    /// - `SessionError::Protocol` if outgoing wire data cannot be encoded
    pub fn handle(&mut self, event: SessionEvent) -> Result<Vec<SessionAction>, SessionError> {
        if self.closed {
            return Ok(vec![]);
        }

        match event {
            SessionEvent::Connected => self.handle_connected(),
            SessionEvent::FrameReceived(frame) => self.handle_frame(&frame),
            SessionEvent::SendMessage { plaintext } => self.handle_send_message(plaintext),
            SessionEvent::HistoryLoaded { envelopes } => Ok(self.handle_history_loaded(&envelopes)),
            SessionEvent::Close => {
                self.closed = true;
                Ok(vec![])
            },
        }
    }

    fn handle_connected(&mut self) -> Result<Vec<SessionAction>, SessionError> {
        let mut actions = Vec::new();

        let join = Payload::Join.into_frame(self.header_for_peer(Opcode::Join))?;
        actions.push(SessionAction::Send(join));
        actions.push(log(format!("joined conversation {:032x}", self.config.conversation_id)));

        actions.push(SessionAction::Send(self.key_announce_frame()?));
        self.last_announce = Some(self.env.now());
        actions.push(log(format!("announced public key to peer {}", self.config.peer_id)));

        if self.state == HandshakeState::NoPeerKey {
            self.state = HandshakeState::KeyExchangePending;
        }

        Ok(actions)
    }

    fn handle_frame(&mut self, frame: &Frame) -> Result<Vec<SessionAction>, SessionError> {
        let header = frame.header;

        if header.sender_id() == self.config.local_id {
            // Room broadcast echo of our own frame; the optimistic local
            // echo already covered it.
            return Ok(vec![]);
        }

        if header.conversation_id() != self.config.conversation_id
            || header.sender_id() != self.config.peer_id
            || header.recipient_id() != self.config.local_id
        {
            return Ok(vec![log(format!(
                "dropping misaddressed frame (opcode {:#06x}, sender {})",
                header.opcode(),
                header.sender_id()
            ))]);
        }

        let payload = match Payload::from_frame(frame) {
            Ok(payload) => payload,
            Err(e) => return Ok(vec![log(format!("dropping undecodable frame: {e}"))]),
        };

        match payload {
            Payload::KeyAnnounce(announce) => self.handle_key_announce(&announce),
            Payload::CipherMessage(message) => {
                Ok(self.handle_cipher_message(header.timestamp_ms(), message))
            },
            Payload::Join => Ok(vec![]),
            Payload::Error(error) => {
                Ok(vec![log(format!("relay error {:#06x}: {}", error.code, error.message))])
            },
        }
    }

    fn handle_key_announce(
        &mut self,
        announce: &KeyAnnounce,
    ) -> Result<Vec<SessionAction>, SessionError> {
        let mut actions = Vec::new();

        match &self.peer_key {
            Some(existing) if existing.as_bytes() == &announce.public_key => {
                actions.push(log(format!(
                    "duplicate key announcement from peer {} ignored",
                    self.config.peer_id
                )));
            },
            Some(_) => {
                actions.push(log(format!(
                    "peer {} announced a different key mid-session; keeping the established session key",
                    self.config.peer_id
                )));
            },
            None => {
                let announced = PeerPublicKey::from(announce.public_key);
                self.session_key = Some(derive_session_key(self.keypair.secret(), &announced));
                self.peer_key = Some(announced);
                self.state = HandshakeState::SessionReady;

                actions.push(SessionAction::PersistPeerKey {
                    peer_id: self.config.peer_id,
                    public_key: announce.public_key,
                });
                actions.push(SessionAction::SessionReady);
                actions.push(log("session key ready".to_string()));
            },
        }

        // Race recovery: our announcement may have gone out before the
        // peer joined the room. Answer theirs with ours, but at most once
        // per cooldown window.
        let now = self.env.now();
        if self.last_announce.is_none_or(|last| now - last >= REANNOUNCE_COOLDOWN) {
            actions.push(SessionAction::Send(self.key_announce_frame()?));
            self.last_announce = Some(now);
            actions.push(log(format!("re-announced public key to peer {}", self.config.peer_id)));
        }

        Ok(actions)
    }

    fn handle_send_message(
        &mut self,
        plaintext: Vec<u8>,
    ) -> Result<Vec<SessionAction>, SessionError> {
        let Some(session_key) = &self.session_key else {
            return Err(SessionError::SendWithoutSession);
        };

        let seq = self.tracker.send_seq();

        let mut nonce = [0u8; NONCE_SIZE];
        self.env.random_bytes(&mut nonce);
        let sealed = seal_message(&plaintext, seq, session_key, nonce);

        let header = self.header_for_peer(Opcode::CipherMessage);
        let timestamp_ms = header.timestamp_ms();

        let frame = Payload::CipherMessage(CipherMessage {
            seq,
            nonce: sealed.nonce,
            ciphertext: sealed.ciphertext,
        })
        .into_frame(header)?;

        // Consume the counter only once the frame exists and is handed to
        // the caller for transmission.
        let assigned = self.tracker.next_send_seq();
        debug_assert_eq!(assigned, seq);

        let entry = TranscriptEntry {
            seq,
            sender_id: self.config.local_id,
            plaintext,
            direction: Direction::Sent,
            timestamp_ms,
        };
        self.transcript.append(entry.clone());

        Ok(vec![SessionAction::Send(frame), SessionAction::TranscriptAppended(entry)])
    }

    fn handle_cipher_message(
        &mut self,
        timestamp_ms: u64,
        message: CipherMessage,
    ) -> Vec<SessionAction> {
        if self.session_key.is_none() {
            return vec![log(format!(
                "dropping ciphertext seq={}: session not ready",
                message.seq
            ))];
        }

        if !self.history_seeded {
            self.pending_live.push((timestamp_ms, message));
            return vec![log(
                "holding live message until history reconciliation completes".to_string(),
            )];
        }

        self.process_live_message(timestamp_ms, message)
    }

    fn process_live_message(
        &mut self,
        timestamp_ms: u64,
        message: CipherMessage,
    ) -> Vec<SessionAction> {
        let peer_id = self.config.peer_id;

        if !self.tracker.would_accept(peer_id, message.seq) {
            return vec![log(format!(
                "rejected replay/reorder seq={} (highest accepted {:?})",
                message.seq,
                self.tracker.recv_seq()
            ))];
        }

        let Some(session_key) = &self.session_key else {
            return vec![log(format!(
                "dropping ciphertext seq={}: session not ready",
                message.seq
            ))];
        };

        let sealed = SealedMessage { nonce: message.nonce, ciphertext: message.ciphertext };
        let plaintext = match open_message(&sealed, message.seq, session_key) {
            Ok(plaintext) => plaintext,
            Err(e) => {
                return vec![log(format!("dropping live message seq={}: {e}", message.seq))];
            },
        };

        if !self.tracker.accept_received(peer_id, message.seq) {
            return vec![log(format!("rejected replay/reorder seq={}", message.seq))];
        }

        let entry = TranscriptEntry {
            seq: message.seq,
            sender_id: peer_id,
            plaintext,
            direction: Direction::Received,
            timestamp_ms,
        };
        self.transcript.append(entry.clone());

        vec![SessionAction::TranscriptAppended(entry)]
    }

    fn handle_history_loaded(&mut self, envelopes: &[StoredEnvelope]) -> Vec<SessionAction> {
        if self.history_seeded {
            return vec![log("history already reconciled; ignoring duplicate load".to_string())];
        }

        let Some(session_key) = &self.session_key else {
            return vec![log("history arrived before the session key; dropping".to_string())];
        };

        let seed = reconcile_history(envelopes, session_key, self.config.local_id);
        let loaded = seed.transcript.len();
        let skipped = seed.skipped;

        // Optimistic local echoes appended before the fetch completed are
        // newer than anything in history; merge them back in.
        let mut merged = seed.transcript;
        for entry in std::mem::take(&mut self.transcript).into_entries() {
            merged.append(entry);
        }
        self.transcript = merged;

        if let Some(max_received) = seed.max_received_seq {
            self.tracker.seed_recv(max_received);
        }
        self.history_seeded = true;

        let mut actions = vec![
            SessionAction::HistoryReconciled { loaded, skipped },
            log(format!("reconciled {loaded} historical messages ({skipped} skipped)")),
        ];

        for (timestamp_ms, message) in std::mem::take(&mut self.pending_live) {
            actions.extend(self.process_live_message(timestamp_ms, message));
        }

        actions
    }

    fn key_announce_frame(&self) -> Result<Frame, SessionError> {
        let announce = KeyAnnounce { public_key: self.keypair.public_bytes() };
        Ok(Payload::KeyAnnounce(announce).into_frame(self.header_for_peer(Opcode::KeyAnnounce))?)
    }

    fn header_for_peer(&self, opcode: Opcode) -> FrameHeader {
        let mut header = FrameHeader::new(opcode);
        header.set_conversation_id(self.config.conversation_id);
        header.set_sender_id(self.config.local_id);
        header.set_recipient_id(self.config.peer_id);
        header.set_timestamp_ms(self.env.wall_clock_ms());
        header
    }
}

fn log(message: String) -> SessionAction {
    SessionAction::Log { message }
}

#[cfg(test)]
mod tests {
    use parley_core::env::ManualEnv;

    use super::*;

    const CONVERSATION: u128 = 0x1234_5678_9abc_def0_1234_5678_9abc_def0;
    const ALICE: u64 = 1;
    const BOB: u64 = 2;

    fn alice_session(cached: Option<PeerPublicKey>) -> Session<ManualEnv> {
        let keypair = IdentityKeypair::from_secret_bytes([0x0A; 32]);
        let config = SessionConfig { local_id: ALICE, peer_id: BOB, conversation_id: CONVERSATION };
        Session::new(ManualEnv::new(1), config, keypair, cached)
    }

    fn bob_keypair() -> IdentityKeypair {
        IdentityKeypair::from_secret_bytes([0x0B; 32])
    }

    fn announce_from_bob(public_key: [u8; 32]) -> Frame {
        let mut header = FrameHeader::new(Opcode::KeyAnnounce);
        header.set_conversation_id(CONVERSATION);
        header.set_sender_id(BOB);
        header.set_recipient_id(ALICE);
        Payload::KeyAnnounce(KeyAnnounce { public_key }).into_frame(header).unwrap()
    }

    fn sent_frames(actions: &[SessionAction]) -> Vec<Frame> {
        actions
            .iter()
            .filter_map(|a| match a {
                SessionAction::Send(frame) => Some(frame.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn connected_joins_and_announces() {
        let mut session = alice_session(None);
        assert_eq!(session.handshake_state(), HandshakeState::NoPeerKey);

        let actions = session.handle(SessionEvent::Connected).unwrap();
        let frames = sent_frames(&actions);

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].header.opcode_enum(), Some(Opcode::Join));
        assert_eq!(frames[1].header.opcode_enum(), Some(Opcode::KeyAnnounce));
        assert_eq!(frames[1].header.recipient_id(), BOB);
        assert_eq!(session.handshake_state(), HandshakeState::KeyExchangePending);
    }

    #[test]
    fn cached_peer_key_starts_ready() {
        let session = alice_session(Some(*bob_keypair().public()));
        assert!(session.is_ready());
    }

    #[test]
    fn announcement_derives_key_and_persists_peer() {
        let mut session = alice_session(None);
        session.handle(SessionEvent::Connected).unwrap();

        let bob_public = bob_keypair().public_bytes();
        let actions =
            session.handle(SessionEvent::FrameReceived(announce_from_bob(bob_public))).unwrap();

        assert!(session.is_ready());
        assert!(actions.iter().any(|a| matches!(
            a,
            SessionAction::PersistPeerKey { peer_id: BOB, public_key } if *public_key == bob_public
        )));
        assert!(actions.iter().any(|a| matches!(a, SessionAction::SessionReady)));
    }

    #[test]
    fn announcement_within_cooldown_is_not_answered() {
        let mut session = alice_session(None);
        session.handle(SessionEvent::Connected).unwrap();

        // Peer's announcement arrives with no virtual time elapsed since
        // our own announcement went out.
        let actions = session
            .handle(SessionEvent::FrameReceived(announce_from_bob(bob_keypair().public_bytes())))
            .unwrap();

        assert!(sent_frames(&actions).is_empty(), "no re-announcement within the cooldown");
    }

    #[test]
    fn announcement_after_cooldown_is_answered_once() {
        let env = ManualEnv::new(1);
        let keypair = IdentityKeypair::from_secret_bytes([0x0A; 32]);
        let config = SessionConfig { local_id: ALICE, peer_id: BOB, conversation_id: CONVERSATION };
        let mut session = Session::new(env.clone(), config, keypair, None);

        session.handle(SessionEvent::Connected).unwrap();
        env.advance(Duration::from_secs(2));

        let bob_public = bob_keypair().public_bytes();
        let actions = session.handle(SessionEvent::FrameReceived(announce_from_bob(bob_public))).unwrap();

        let frames = sent_frames(&actions);
        assert_eq!(frames.len(), 1, "cooldown elapsed: exactly one re-announcement");
        assert_eq!(frames[0].header.opcode_enum(), Some(Opcode::KeyAnnounce));

        // An immediate duplicate announcement is inside the new cooldown.
        let actions = session.handle(SessionEvent::FrameReceived(announce_from_bob(bob_public))).unwrap();
        assert!(sent_frames(&actions).is_empty());
    }

    #[test]
    fn different_key_mid_session_is_ignored() {
        let mut session = alice_session(Some(*bob_keypair().public()));

        let other = IdentityKeypair::from_secret_bytes([0x0C; 32]);
        let actions = session
            .handle(SessionEvent::FrameReceived(announce_from_bob(other.public_bytes())))
            .unwrap();

        assert!(session.is_ready());
        assert!(
            !actions.iter().any(|a| matches!(a, SessionAction::PersistPeerKey { .. })),
            "a different key must not replace the cached one"
        );
    }

    #[test]
    fn send_without_session_is_rejected_without_state_change() {
        let mut session = alice_session(None);

        let result = session.handle(SessionEvent::SendMessage { plaintext: b"hi".to_vec() });
        assert!(matches!(result, Err(SessionError::SendWithoutSession)));

        assert_eq!(session.sequence_tracker().send_seq(), 0, "counter must not be consumed");
        assert!(session.transcript().is_empty());
    }

    #[test]
    fn send_appends_optimistic_echo_and_increments_seq() {
        let mut session = alice_session(Some(*bob_keypair().public()));
        session.handle(SessionEvent::HistoryLoaded { envelopes: vec![] }).unwrap();

        let actions =
            session.handle(SessionEvent::SendMessage { plaintext: b"hello".to_vec() }).unwrap();

        assert_eq!(sent_frames(&actions).len(), 1);
        assert!(actions.iter().any(|a| matches!(
            a,
            SessionAction::TranscriptAppended(entry)
                if entry.direction == Direction::Sent && entry.seq == 0
        )));
        assert_eq!(session.sequence_tracker().send_seq(), 1);
        assert_eq!(session.transcript().len(), 1);
    }

    #[test]
    fn live_message_before_history_is_queued() {
        let alice_keys = IdentityKeypair::from_secret_bytes([0x0A; 32]);
        let bob_keys = bob_keypair();
        let mut session = alice_session(Some(*bob_keys.public()));

        let key = derive_session_key(bob_keys.secret(), alice_keys.public());
        let sealed = seal_message(b"early", 0, &key, [9; NONCE_SIZE]);

        let mut header = FrameHeader::new(Opcode::CipherMessage);
        header.set_conversation_id(CONVERSATION);
        header.set_sender_id(BOB);
        header.set_recipient_id(ALICE);
        header.set_timestamp_ms(5_000);
        let frame = Payload::CipherMessage(CipherMessage {
            seq: 0,
            nonce: sealed.nonce,
            ciphertext: sealed.ciphertext,
        })
        .into_frame(header)
        .unwrap();

        let actions = session.handle(SessionEvent::FrameReceived(frame)).unwrap();
        assert!(
            !actions.iter().any(|a| matches!(a, SessionAction::TranscriptAppended(_))),
            "message must be held until history reconciles"
        );
        assert!(session.transcript().is_empty());

        // Empty history load is the explicit skip; the queue drains.
        let actions = session.handle(SessionEvent::HistoryLoaded { envelopes: vec![] }).unwrap();
        assert!(actions.iter().any(|a| matches!(
            a,
            SessionAction::TranscriptAppended(entry) if entry.plaintext == b"early"
        )));
        assert_eq!(session.transcript().len(), 1);
    }

    #[test]
    fn misaddressed_frames_are_dropped() {
        let mut session = alice_session(Some(*bob_keypair().public()));
        session.handle(SessionEvent::HistoryLoaded { envelopes: vec![] }).unwrap();

        // Announcement from an unexpected sender.
        let mut header = FrameHeader::new(Opcode::KeyAnnounce);
        header.set_conversation_id(CONVERSATION);
        header.set_sender_id(99);
        header.set_recipient_id(ALICE);
        let frame = Payload::KeyAnnounce(KeyAnnounce { public_key: [1; 32] })
            .into_frame(header)
            .unwrap();

        let actions = session.handle(SessionEvent::FrameReceived(frame)).unwrap();
        assert!(sent_frames(&actions).is_empty());
        assert!(actions.iter().any(|a| matches!(a, SessionAction::Log { .. })));
    }

    #[test]
    fn own_echoed_frame_is_skipped() {
        let mut session = alice_session(Some(*bob_keypair().public()));
        session.handle(SessionEvent::HistoryLoaded { envelopes: vec![] }).unwrap();

        let actions =
            session.handle(SessionEvent::SendMessage { plaintext: b"mine".to_vec() }).unwrap();
        let echoed = sent_frames(&actions).remove(0);

        let actions = session.handle(SessionEvent::FrameReceived(echoed)).unwrap();
        assert!(actions.is_empty(), "own room-broadcast echo must be ignored");
        assert_eq!(session.transcript().len(), 1, "only the optimistic echo remains");
    }

    #[test]
    fn closed_session_discards_everything() {
        let mut session = alice_session(Some(*bob_keypair().public()));

        session.handle(SessionEvent::Close).unwrap();
        assert!(session.is_closed());

        // A late history fetch completion must be discarded.
        let actions = session.handle(SessionEvent::HistoryLoaded { envelopes: vec![] }).unwrap();
        assert!(actions.is_empty());
        assert!(session.transcript().is_empty());

        let actions = session.handle(SessionEvent::Connected).unwrap();
        assert!(actions.is_empty());
    }
}
