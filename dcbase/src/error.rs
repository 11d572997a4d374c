use crate::message::MessageType;

/// Errors raised while parsing datagrams off the wire.
///
/// These never carry raw socket or OS error strings: a value of this type
/// is built only from the bytes of a single datagram.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("datagram too short: need at least {need} bytes, got {got}")]
    UnexpectedEof { need: usize, got: usize },

    #[error("unknown message type byte {0:#x}")]
    InvalidMessageType(u8),

    #[error("expected a {expected:?} datagram, got {actual:?}")]
    UnexpectedMessageType {
        expected: MessageType,
        actual: MessageType,
    },

    #[error("packet declares a negative count field")]
    NegativeCount,

    #[error("packet_index {index} >= packet_count {count}")]
    IndexOutOfRange { index: i32, count: i32 },

    #[error("session id mismatch: expected {expected}, got {actual}")]
    SessionMismatch { expected: i32, actual: i32 },
}
