use crate::error::Error;

/// The 1-byte message type that begins every datagram.
///
/// `0`/`1`/`2` are fixed by the protocol; the sender→receiver variants use
/// type codes chosen by this implementation, fixed for the protocol's
/// lifetime and kept distinct from `0`/`1`/`2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageType {
    /// Receiver → sender, session bootstrap.
    Ping = 0,
    /// Receiver → sender, per decoded frame.
    Report = 1,
    /// Receiver → sender, missing packet indices for a frame.
    Nack = 2,
    /// Sender → receiver, one fragment of a frame's compressed payload.
    Data = 3,
    /// Sender → receiver, one XOR parity packet for a group of data packets.
    Xor = 4,
    /// Sender → receiver, one fragment of the calibration blob.
    Init = 5,
}

impl MessageType {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for MessageType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(MessageType::Ping),
            1 => Ok(MessageType::Report),
            2 => Ok(MessageType::Nack),
            3 => Ok(MessageType::Data),
            4 => Ok(MessageType::Xor),
            5 => Ok(MessageType::Init),
            other => Err(Error::InvalidMessageType(other)),
        }
    }
}
