use bytes::Bytes;

use crate::error::Error;

/// A single-plane color image, already in the YUV color space the color
/// encoder expects.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorImage {
    pub width: u32,
    pub height: u32,
    pub yuv: Bytes,
}

/// A depth image as 16-bit signed millimeter samples, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<i16>,
}

/// One captured color+depth pair and the device timestamp it was taken at.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedFrame {
    pub color: ColorImage,
    pub depth: DepthImage,
    pub device_timestamp_us: i64,
}

/// The capture device collaborator.
///
/// Camera driver specifics are out of scope; this trait is the entire
/// contract the producer loop relies on.
pub trait Capture {
    /// Pull the next available capture. `Ok(None)` means no frame is ready
    /// yet and the current producer iteration is skipped silently; `Err`
    /// means the device itself has failed.
    fn get_capture(&mut self) -> Result<Option<CapturedFrame>, Error>;

    /// The calibration blob, opaque to the core, retrieved once at startup
    /// and sent to the receiver in the init packet.
    fn calibration_blob(&self) -> Bytes;
}
