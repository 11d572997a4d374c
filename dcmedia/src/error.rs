/// Failures surfaced by a [`crate::capture::Capture`] device or an encoder.
///
/// These never cross the wire; they are handled entirely inside the
/// producer loop (capture/encoder failures skip the current iteration, they
/// never abort the session).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("capture device unavailable: {0}")]
    CaptureUnavailable(String),

    #[error("encoder failed: {0}")]
    EncoderFailure(String),
}
