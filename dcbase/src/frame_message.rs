use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::Error;
use crate::packet::require;

/// The uncompressed-on-the-wire representation of one captured frame,
/// before fragmentation: a timestamp, a keyframe flag, and the two
/// independently-compressed color and depth payloads.
///
/// This is the message `fragment_message` splits into [`crate::packet::DataPacket`]s; it
/// never appears on the wire as a single datagram, only reassembled from
/// its fragments.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameMessage {
    pub frame_timestamp_ms: f32,
    pub keyframe: bool,
    pub color: Bytes,
    pub depth: Bytes,
}

impl FrameMessage {
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(4 + 1 + 4 + self.color.len() + 4 + self.depth.len());
        buf.put_f32_le(self.frame_timestamp_ms);
        buf.put_u8(self.keyframe as u8);
        buf.put_i32_le(self.color.len() as i32);
        buf.put_slice(&self.color);
        buf.put_i32_le(self.depth.len() as i32);
        buf.put_slice(&self.depth);
        buf.freeze()
    }

    pub fn decode(mut body: Bytes) -> Result<Self, Error> {
        require(&body, 4 + 1 + 4)?;
        let frame_timestamp_ms = body.get_f32_le();
        let keyframe = body.get_u8() != 0;
        let color_len = body.get_i32_le();
        if color_len < 0 {
            return Err(Error::NegativeCount);
        }
        require(&body, color_len as usize + 4)?;
        let color = body.split_to(color_len as usize);
        let depth_len = body.get_i32_le();
        if depth_len < 0 {
            return Err(Error::NegativeCount);
        }
        require(&body, depth_len as usize)?;
        let depth = body.split_to(depth_len as usize);
        Ok(Self {
            frame_timestamp_ms,
            keyframe,
            color,
            depth,
        })
    }
}
