use std::sync::Arc;

use dcbase::{FrameId, FrameMessage, SessionId, fec, fragment};
use dcmedia::{Capture, ColorEncoder, DepthEncoder};
use dcrecovery::{FramePacketSet, Pacer};

use crate::queue::FrameQueueSender;
use crate::shared_state::SharedState;

/// Runs the producer loop until the shared stop flag is set.
///
/// Each iteration: pull a capture, apply the pacing rule against the
/// receiver's latest ack, decide keyframe, encode, assemble the frame
/// message, fragment it and build its XOR parity, then hand the result to
/// the network worker. A dropped capture, a paced-out iteration, or a full
/// queue all simply skip to the next iteration without advancing `frame_id`
/// or the pacer's last-transmitted timestamp.
pub fn run_producer(
    session_id: SessionId,
    mut capture: impl Capture,
    mut color_encoder: impl ColorEncoder,
    mut depth_encoder: impl DepthEncoder,
    capture_interval_us: i64,
    queue_tx: FrameQueueSender,
    shared: Arc<SharedState>,
) {
    let mut pacer = Pacer::new(capture_interval_us);
    let mut frame_id = FrameId::ZERO;

    while !shared.is_stopped() {
        let captured = match capture.get_capture() {
            Ok(Some(frame)) => frame,
            Ok(None) => continue,
            Err(err) => {
                tracing::debug!(error = %err, "capture unavailable, skipping iteration");
                continue;
            }
        };

        let frame_id_diff = frame_id.diff(shared.latest_receiver_ack());
        if !pacer.should_transmit(frame_id_diff, captured.device_timestamp_us) {
            continue;
        }
        let keyframe = Pacer::is_keyframe(frame_id_diff);

        let color = match color_encoder.encode(&captured.color, keyframe) {
            Ok(bytes) if !bytes.is_empty() => bytes,
            Ok(_) => {
                tracing::debug!("color encoder produced an empty buffer, skipping frame");
                continue;
            }
            Err(err) => {
                tracing::warn!(error = %err, "color encoder failed, skipping frame");
                continue;
            }
        };
        let depth = match depth_encoder.encode(&captured.depth, keyframe) {
            Ok(bytes) if !bytes.is_empty() => bytes,
            Ok(_) => {
                tracing::debug!("depth encoder produced an empty buffer, skipping frame");
                continue;
            }
            Err(err) => {
                tracing::warn!(error = %err, "depth encoder failed, skipping frame");
                continue;
            }
        };

        let message = FrameMessage {
            frame_timestamp_ms: (captured.device_timestamp_us as f64 / 1000.0) as f32,
            keyframe,
            color,
            depth,
        }
        .encode();

        let data_packets = fragment::fragment_message(session_id, frame_id, &message);
        let xor_packets = fec::build_xor_packets(session_id, frame_id, &data_packets);
        let set = FramePacketSet {
            frame_id,
            data_packets,
            xor_packets,
        };

        if queue_tx.try_send(set).is_err() {
            tracing::debug!(%frame_id, "producer queue full, dropping frame");
            continue;
        }

        pacer.record_transmission(captured.device_timestamp_us);
        frame_id = frame_id.next();
    }
}
