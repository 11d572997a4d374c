//! `depthcast-sender`: prompts for a UDP port, then streams a synthetic
//! RGB-D feed to whichever receiver pings that port first.
//!
//! A real capture device and codecs are out of scope for this crate; this
//! binary drives `dcmedia`'s deterministic in-memory
//! [`dcmedia::SyntheticCapture`] and pass-through encoders instead, so the
//! protocol can be exercised end to end without camera hardware.

use depthcast::cli::prompt_for_port;
use depthcast::run_sender_session;
use dcmedia::{PassthroughColorEncoder, PassthroughDepthEncoder, SyntheticCapture};

/// The native capture interval assumed absent a real device to query one
/// from: 33 ms, i.e. 30 fps.
const CAPTURE_INTERVAL_US: i64 = 33_000;

const CAPTURE_WIDTH: u32 = 640;
const CAPTURE_HEIGHT: u32 = 480;

fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    loop {
        let port = match prompt_for_port() {
            Ok(port) => port,
            Err(err) => {
                tracing::error!(error = %err, "failed to read port from stdin");
                return std::process::ExitCode::FAILURE;
            }
        };

        let capture = SyntheticCapture::new(CAPTURE_WIDTH, CAPTURE_HEIGHT, CAPTURE_INTERVAL_US);
        let result = run_sender_session(
            port,
            capture,
            PassthroughColorEncoder,
            PassthroughDepthEncoder,
            CAPTURE_INTERVAL_US,
        );

        match result {
            Ok(()) => {
                tracing::info!("session ended cleanly");
                return std::process::ExitCode::SUCCESS;
            }
            Err(err) => {
                tracing::error!(error = %err, "session aborted, re-prompting for a port");
            }
        }
    }
}
