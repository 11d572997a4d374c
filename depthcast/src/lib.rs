//! Real-time RGB-D streaming over UDP.
//!
//! This crate wires the wire format (`dcbase`), sender-side bookkeeping
//! (`dcrecovery`), the socket wrapper (`dcudp`) and the capture/encoder
//! collaborators (`dcmedia`) into the two runtime roles the protocol
//! defines: a sender (bootstrap, producer loop, network worker) and a
//! receiver (bootstrap, reassembler loop). The `depthcast-sender` and
//! `depthcast-receiver` binaries in `src/bin/` are thin wrappers around
//! [`run_sender_session`] and [`run_receiver_session`].

pub mod bootstrap;
pub mod cli;
pub mod error;
pub mod producer;
pub mod queue;
pub mod reassembler;
pub mod sender_worker;
pub mod shared_state;

use std::net::{SocketAddr, ToSocketAddrs};
use std::thread;
use std::time::Duration;

use dcbase::SessionId;
use dcmedia::{Capture, ColorEncoder, DepthEncoder};
use dcrecovery::{ArcRetentionMap, ArcSendTimeMap};
use dcudp::DcSocket;

pub use error::SessionError;
pub use reassembler::{CompletedFrame, Reassembler};
pub use shared_state::SharedState;

/// Run one full sender session on `port`: bind, wait for the receiver's
/// ping, send the init datagram(s), then run the producer and network
/// worker threads until either exits (a fatal socket error, or the process
/// being asked to stop).
///
/// Returns once the session has ended; the caller (the `depthcast-sender`
/// binary) decides whether to re-prompt for a new port.
pub fn run_sender_session(
    port: u16,
    capture: impl Capture + Send + 'static,
    color_encoder: impl ColorEncoder + Send + 'static,
    depth_encoder: impl DepthEncoder + Send + 'static,
    capture_interval_us: i64,
) -> Result<(), SessionError> {
    let session_id = SessionId::generate();
    let socket = DcSocket::bind(("0.0.0.0", port)).map_err(SessionError::FatalSocket)?;
    tracing::info!(port, %session_id, "bound sender socket, waiting for receiver ping");

    let calibration_blob = capture.calibration_blob();
    let peer = bootstrap::sender_bootstrap(&socket, session_id, calibration_blob)?;
    tracing::info!(%peer, "receiver bootstrapped, starting session");

    let shared = SharedState::new();
    let retention = ArcRetentionMap::new();
    let send_time = ArcSendTimeMap::new();
    let (queue_tx, queue_rx) = queue::frame_queue();

    let producer_shared = shared.clone();
    let producer_handle = thread::Builder::new()
        .name("depthcast-producer".into())
        .spawn(move || {
            producer::run_producer(
                session_id,
                capture,
                color_encoder,
                depth_encoder,
                capture_interval_us,
                queue_tx,
                producer_shared,
            );
        })
        .map_err(SessionError::FatalSocket)?;

    let worker = sender_worker::SenderWorker::new(socket, peer, retention, send_time, queue_rx, shared.clone());
    let result = worker.run();

    // The worker only returns after the stop flag is set; make sure the
    // producer observes it and winds down too, whether or not the worker
    // itself hit a fatal error.
    shared.stop();
    let _ = producer_handle.join();
    result.map_err(SessionError::FatalSocket)
}

/// How often the receiver loop checks for incomplete frames to NACK, in
/// terms of incoming datagrams processed, absent a more precise timer.
const NACK_CHECK_EVERY_PACKETS: u32 = 32;

/// Evict frame state this many ids behind the newest completed frame: far
/// enough that it can no longer usefully complete.
const REASSEMBLER_RETENTION_WINDOW: i32 = 64;

/// Run one full receiver session against `sender_addr`: ping, await init,
/// then loop forever reassembling frames, emitting reports for each
/// completed frame and periodic NACKs for frames still missing data.
pub fn run_receiver_session<A: ToSocketAddrs>(sender_addr: A) -> Result<(), SessionError> {
    let socket = DcSocket::bind("0.0.0.0:0").map_err(SessionError::FatalSocket)?;
    let sender_addr = resolve_one(sender_addr)?;

    let (session_id, calibration_blob) = bootstrap::receiver_bootstrap(&socket, sender_addr)?;
    tracing::info!(%session_id, calibration_bytes = calibration_blob.len(), "session initialized");

    let mut reassembler = Reassembler::new(session_id);
    let mut buf = [0u8; dcbase::constants::MTU];
    let mut packets_since_nack_check = 0u32;

    loop {
        match socket.recv_from(&mut buf) {
            Ok((len, from)) if from == sender_addr => {
                if let Err(err) = reassembler.ingest(&buf[..len]) {
                    tracing::warn!(error = %err, "dropping malformed or mismatched datagram");
                    continue;
                }
                packets_since_nack_check += 1;
            }
            Ok(_) => continue,
            Err(err) if dcudp::is_transient(&err) => {
                thread::sleep(Duration::from_millis(1));
            }
            Err(err) => return Err(SessionError::FatalSocket(err)),
        }

        for completed in reassembler.take_completed() {
            emit_report(&socket, sender_addr, &completed)?;
        }

        if packets_since_nack_check >= NACK_CHECK_EVERY_PACKETS {
            packets_since_nack_check = 0;
            for (frame_id, missing) in reassembler.pending_nacks() {
                let nack = dcbase::Nack { frame_id, missing };
                if let Err(err) = socket.send_to(&nack.encode(), sender_addr) {
                    if !dcudp::is_transient(&err) {
                        return Err(SessionError::FatalSocket(err));
                    }
                }
            }
            if let Some(newest) = reassembler.highest_completed() {
                reassembler.evict_up_to(newest.saturating_sub(REASSEMBLER_RETENTION_WINDOW));
            }
        }
    }
}

fn emit_report(socket: &DcSocket, sender_addr: SocketAddr, completed: &CompletedFrame) -> Result<(), SessionError> {
    let report = dcbase::ReceiverReport {
        frame_id: completed.frame_id,
        packet_collection_ms: completed.packet_collection_ms,
        decoder_ms: completed.decoder_ms,
        frame_timestamp_ms: completed.message.frame_timestamp_ms,
        packet_count: completed.packet_count,
    };
    match socket.send_to(&report.encode(), sender_addr) {
        Ok(_) => Ok(()),
        Err(err) if dcudp::is_transient(&err) => Ok(()),
        Err(err) => Err(SessionError::FatalSocket(err)),
    }
}

trait FrameIdExt {
    fn saturating_sub(self, n: i32) -> Self;
}

impl FrameIdExt for dcbase::FrameId {
    fn saturating_sub(self, n: i32) -> Self {
        dcbase::FrameId::from((self.into_inner() - n).max(0))
    }
}

fn resolve_one<A: ToSocketAddrs>(addr: A) -> Result<SocketAddr, SessionError> {
    addr.to_socket_addrs()
        .map_err(SessionError::FatalSocket)?
        .next()
        .ok_or_else(|| SessionError::SessionAbort("could not resolve sender address".to_string()))
}
