//! Wire format, session/frame identifiers, fragmentation and XOR forward
//! error correction for the depthcast RGB-D streaming protocol.
//!
//! This crate has no I/O of its own: it only encodes, decodes, splits and
//! reassembles the bytes that travel between a sender and a receiver.
//! Socket handling lives in `dcudp`, retransmission and pacing state in
//! `dcrecovery`.

pub mod constants;
pub mod error;
pub mod fec;
pub mod fragment;
pub mod frame_message;
pub mod message;
pub mod packet;
pub mod session;

pub use error::Error;
pub use frame_message::FrameMessage;
pub use message::MessageType;
pub use packet::{DataPacket, InitFragment, Nack, Ping, ReceiverReport, XorPacket, peek_message_type};
pub use session::{FrameId, SessionId};
