use bytes::Bytes;

use crate::capture::{ColorImage, DepthImage};
use crate::error::Error;

/// Standard video codec collaborator, producing one compressed payload per
/// call.
pub trait ColorEncoder {
    fn encode(&mut self, image: &ColorImage, keyframe: bool) -> Result<Bytes, Error>;
}

/// Temporal run-length / change-threshold depth codec collaborator.
pub trait DepthEncoder {
    fn encode(&mut self, image: &DepthImage, keyframe: bool) -> Result<Bytes, Error>;
}
