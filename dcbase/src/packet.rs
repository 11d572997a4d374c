use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::{
    constants::{DATA_HEADER_LEN, INIT_HEADER_LEN, XOR_HEADER_LEN},
    error::Error,
    message::MessageType,
    session::{FrameId, SessionId},
};

pub(crate) fn require(buf: &[u8], need: usize) -> Result<(), Error> {
    if buf.len() < need {
        Err(Error::UnexpectedEof {
            need,
            got: buf.len(),
        })
    } else {
        Ok(())
    }
}

/// Receiver → sender ping. Carries no body; its arrival is the bootstrap
/// signal that starts a session.
pub struct Ping;

impl Ping {
    pub fn encode() -> Bytes {
        Bytes::from_static(&[MessageType::Ping as u8])
    }
}

/// Receiver → sender, type `1`: per-frame decode telemetry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReceiverReport {
    pub frame_id: FrameId,
    pub packet_collection_ms: f32,
    pub decoder_ms: f32,
    pub frame_timestamp_ms: f32,
    pub packet_count: i32,
}

impl ReceiverReport {
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(1 + 4 * 5);
        buf.put_u8(MessageType::Report as u8);
        buf.put_i32_le(self.frame_id.into_inner());
        buf.put_f32_le(self.packet_collection_ms);
        buf.put_f32_le(self.decoder_ms);
        buf.put_f32_le(self.frame_timestamp_ms);
        buf.put_i32_le(self.packet_count);
        buf.freeze()
    }

    pub fn decode(mut body: &[u8]) -> Result<Self, Error> {
        require(body, 4 * 5)?;
        let frame_id = FrameId::from(body.get_i32_le());
        let packet_collection_ms = body.get_f32_le();
        let decoder_ms = body.get_f32_le();
        let frame_timestamp_ms = body.get_f32_le();
        let packet_count = body.get_i32_le();
        if packet_count < 0 {
            return Err(Error::NegativeCount);
        }
        Ok(Self {
            frame_id,
            packet_collection_ms,
            decoder_ms,
            frame_timestamp_ms,
            packet_count,
        })
    }
}

/// Receiver → sender, type `2`: the packet indices still missing for a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Nack {
    pub frame_id: FrameId,
    pub missing: Vec<i32>,
}

impl Nack {
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(1 + 4 + 4 + self.missing.len() * 4);
        buf.put_u8(MessageType::Nack as u8);
        buf.put_i32_le(self.frame_id.into_inner());
        buf.put_i32_le(self.missing.len() as i32);
        for idx in &self.missing {
            buf.put_i32_le(*idx);
        }
        buf.freeze()
    }

    pub fn decode(mut body: &[u8]) -> Result<Self, Error> {
        require(body, 8)?;
        let frame_id = FrameId::from(body.get_i32_le());
        let count = body.get_i32_le();
        if count < 0 {
            return Err(Error::NegativeCount);
        }
        require(body, count as usize * 4)?;
        let missing = (0..count).map(|_| body.get_i32_le()).collect();
        Ok(Self { frame_id, missing })
    }
}

/// Sender → receiver, type `3`: one fragment of a frame's compressed
/// payload.
#[derive(Debug, Clone, PartialEq)]
pub struct DataPacket {
    pub session_id: SessionId,
    pub frame_id: FrameId,
    pub packet_index: i32,
    pub packet_count: i32,
    pub payload: Bytes,
}

impl DataPacket {
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(DATA_HEADER_LEN + self.payload.len());
        buf.put_u8(MessageType::Data as u8);
        buf.put_i32_le(self.session_id.into_inner());
        buf.put_i32_le(self.frame_id.into_inner());
        buf.put_i32_le(self.packet_index);
        buf.put_i32_le(self.packet_count);
        buf.put_slice(&self.payload);
        buf.freeze()
    }

    /// Decode the body that follows the 1-byte type already consumed by the
    /// caller.
    pub fn decode(body: Bytes) -> Result<Self, Error> {
        require(&body, DATA_HEADER_LEN - 1)?;
        let mut cursor = body;
        let session_id = SessionId::from(cursor.get_i32_le());
        let frame_id = FrameId::from(cursor.get_i32_le());
        let packet_index = cursor.get_i32_le();
        let packet_count = cursor.get_i32_le();
        if packet_index < 0 || packet_count < 0 {
            return Err(Error::NegativeCount);
        }
        if packet_index >= packet_count {
            return Err(Error::IndexOutOfRange {
                index: packet_index,
                count: packet_count,
            });
        }
        Ok(Self {
            session_id,
            frame_id,
            packet_index,
            packet_count,
            payload: cursor,
        })
    }
}

/// Sender → receiver, type `4`: one XOR parity packet for `[group_start,
/// group_start + group_length)`.
#[derive(Debug, Clone, PartialEq)]
pub struct XorPacket {
    pub session_id: SessionId,
    pub frame_id: FrameId,
    pub group_start: i32,
    pub group_length: i32,
    pub parity: Bytes,
}

impl XorPacket {
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(XOR_HEADER_LEN + self.parity.len());
        buf.put_u8(MessageType::Xor as u8);
        buf.put_i32_le(self.session_id.into_inner());
        buf.put_i32_le(self.frame_id.into_inner());
        buf.put_i32_le(self.group_start);
        buf.put_i32_le(self.group_length);
        buf.put_slice(&self.parity);
        buf.freeze()
    }

    pub fn decode(body: Bytes) -> Result<Self, Error> {
        require(&body, XOR_HEADER_LEN - 1)?;
        let mut cursor = body;
        let session_id = SessionId::from(cursor.get_i32_le());
        let frame_id = FrameId::from(cursor.get_i32_le());
        let group_start = cursor.get_i32_le();
        let group_length = cursor.get_i32_le();
        if group_start < 0 || group_length < 0 {
            return Err(Error::NegativeCount);
        }
        Ok(Self {
            session_id,
            frame_id,
            group_start,
            group_length,
            parity: cursor,
        })
    }
}

/// Sender → receiver, type `5`: one fragment of the calibration blob sent
/// once at session bootstrap.
#[derive(Debug, Clone, PartialEq)]
pub struct InitFragment {
    pub session_id: SessionId,
    pub fragment_index: i32,
    pub fragment_count: i32,
    pub payload: Bytes,
}

impl InitFragment {
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(INIT_HEADER_LEN + self.payload.len());
        buf.put_u8(MessageType::Init as u8);
        buf.put_i32_le(self.session_id.into_inner());
        buf.put_i32_le(self.fragment_index);
        buf.put_i32_le(self.fragment_count);
        buf.put_slice(&self.payload);
        buf.freeze()
    }

    pub fn decode(body: Bytes) -> Result<Self, Error> {
        require(&body, INIT_HEADER_LEN - 1)?;
        let mut cursor = body;
        let session_id = SessionId::from(cursor.get_i32_le());
        let fragment_index = cursor.get_i32_le();
        let fragment_count = cursor.get_i32_le();
        if fragment_index < 0 || fragment_count < 0 {
            return Err(Error::NegativeCount);
        }
        Ok(Self {
            session_id,
            fragment_index,
            fragment_count,
            payload: cursor,
        })
    }
}

/// Peek the leading message-type byte without consuming the datagram.
pub fn peek_message_type(datagram: &[u8]) -> Result<MessageType, Error> {
    require(datagram, 1)?;
    MessageType::try_from(datagram[0])
}
