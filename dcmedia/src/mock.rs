//! Deterministic in-memory implementations of the capture and encoder
//! traits, used by integration tests and the sender binary's demo mode.
//! None of this touches real camera or codec hardware.

use bytes::{Bytes, BytesMut};

use crate::capture::{Capture, CapturedFrame, ColorImage, DepthImage};
use crate::encoder::{ColorEncoder, DepthEncoder};
use crate::error::Error;

/// Synthesizes a fixed-size color+depth pair on every call, advancing the
/// device timestamp by a configurable interval. Never reports "unavailable"
/// — useful for exercising the pacing and retention paths without needing
/// real hardware to stall.
pub struct SyntheticCapture {
    width: u32,
    height: u32,
    interval_us: i64,
    next_timestamp_us: i64,
    calibration_blob: Bytes,
}

impl SyntheticCapture {
    pub fn new(width: u32, height: u32, interval_us: i64) -> Self {
        Self {
            width,
            height,
            interval_us,
            next_timestamp_us: 0,
            calibration_blob: Bytes::from_static(b"synthetic-calibration"),
        }
    }
}

impl Capture for SyntheticCapture {
    fn get_capture(&mut self) -> Result<Option<CapturedFrame>, Error> {
        let pixel_count = (self.width * self.height) as usize;
        let yuv = BytesMut::zeroed(pixel_count + pixel_count / 2).freeze();
        let pixels = vec![0i16; pixel_count];
        let frame = CapturedFrame {
            color: ColorImage {
                width: self.width,
                height: self.height,
                yuv,
            },
            depth: DepthImage {
                width: self.width,
                height: self.height,
                pixels,
            },
            device_timestamp_us: self.next_timestamp_us,
        };
        self.next_timestamp_us += self.interval_us;
        Ok(Some(frame))
    }

    fn calibration_blob(&self) -> Bytes {
        self.calibration_blob.clone()
    }
}

/// Copies the input through unchanged, standing in for a real video codec
/// in tests. Fails (per the encoder-failure error path) on an empty image,
/// since a real codec can never usefully compress zero bytes.
#[derive(Debug, Default)]
pub struct PassthroughColorEncoder;

impl ColorEncoder for PassthroughColorEncoder {
    fn encode(&mut self, image: &ColorImage, _keyframe: bool) -> Result<Bytes, Error> {
        if image.yuv.is_empty() {
            return Err(Error::EncoderFailure("empty color image".to_string()));
        }
        Ok(image.yuv.clone())
    }
}

/// Packs depth samples as little-endian `i16`s, standing in for a real
/// temporal run-length codec in tests.
#[derive(Debug, Default)]
pub struct PassthroughDepthEncoder;

impl DepthEncoder for PassthroughDepthEncoder {
    fn encode(&mut self, image: &DepthImage, _keyframe: bool) -> Result<Bytes, Error> {
        if image.pixels.is_empty() {
            return Err(Error::EncoderFailure("empty depth image".to_string()));
        }
        let mut buf = BytesMut::with_capacity(image.pixels.len() * 2);
        for sample in &image.pixels {
            buf.extend_from_slice(&sample.to_le_bytes());
        }
        Ok(buf.freeze())
    }
}
