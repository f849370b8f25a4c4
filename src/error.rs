//! Error types for the simulation, the wire protocol and the peer transport.

use crate::sim::Role;

#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("player '{0}' is already registered")]
    DuplicatePlayer(Role),
}

/// Rejection of a single inbound message. Never fatal to the frame loop.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("input snapshot contains non-finite values")]
    NonFiniteInput,

    #[error("look delta exceeds {max} radians per frame", max = crate::sim::state::MAX_LOOK_STEP)]
    LookOutOfRange,
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("frame of {0} bytes exceeds the {max} byte limit", max = crate::core::network::MAX_FRAME_LEN)]
    FrameTooLarge(usize),

    #[error("frame is not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("peer speaks '{0}', expected '{expected}'", expected = crate::core::network::PROTOCOL_TAG)]
    ProtocolMismatch(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
