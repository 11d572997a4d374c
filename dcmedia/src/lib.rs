//! External-collaborator traits for the depthcast producer: the capture
//! device and the two compressors. Real camera and codec bindings are out
//! of scope; this crate only defines the boundary and ships deterministic
//! in-memory implementations for tests and demo runs.

pub mod capture;
pub mod encoder;
pub mod error;
pub mod mock;

pub use capture::{Capture, CapturedFrame, ColorImage, DepthImage};
pub use encoder::{ColorEncoder, DepthEncoder};
pub use error::Error;
pub use mock::{PassthroughColorEncoder, PassthroughDepthEncoder, SyntheticCapture};
