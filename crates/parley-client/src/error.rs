//! Error types for the session state machine.
//!
//! Only caller-facing precondition violations and wire-encoding failures
//! surface as `Err`. Cryptographic and sequencing failures on the receive
//! path never crash the session: the affected message is dropped and
//! reported through a [`crate::SessionAction::Log`] action instead.

use thiserror::Error;

/// Errors returned to the caller by [`crate::Session::handle`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// A send was attempted before the session key exists.
    ///
    /// The send is rejected with no partial state change: the send
    /// counter is not consumed and nothing reaches the transcript.
    #[error("cannot send before the session key is established")]
    SendWithoutSession,

    /// Outgoing wire data could not be encoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] parley_proto::ProtocolError),
}
