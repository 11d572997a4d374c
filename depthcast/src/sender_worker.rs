use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use dcbase::constants::MTU;
use dcbase::{MessageType, Nack, ReceiverReport, peek_message_type};
use dcrecovery::{ArcRetentionMap, ArcSendTimeMap};
use dcudp::{DcSocket, is_transient};

use crate::queue::FrameQueueReceiver;
use crate::shared_state::SharedState;

/// Emit a send summary every this many newly-acknowledged frames.
const TELEMETRY_INTERVAL_FRAMES: u64 = 100;

/// Drains the producer queue, transmits frames, answers receiver feedback
/// and retransmits NACKed packets from the retention map, until a fatal
/// socket error occurs or the shared stop flag is set.
pub struct SenderWorker {
    socket: DcSocket,
    peer: SocketAddr,
    retention: ArcRetentionMap,
    send_time: ArcSendTimeMap,
    queue_rx: FrameQueueReceiver,
    shared: Arc<SharedState>,
    sent_packets: u64,
    observed_packets: u64,
    acked_frames_since_telemetry: u64,
    last_telemetry_at: Instant,
    fatal_error: Option<io::Error>,
}

impl SenderWorker {
    pub fn new(
        socket: DcSocket,
        peer: SocketAddr,
        retention: ArcRetentionMap,
        send_time: ArcSendTimeMap,
        queue_rx: FrameQueueReceiver,
        shared: Arc<SharedState>,
    ) -> Self {
        Self {
            socket,
            peer,
            retention,
            send_time,
            queue_rx,
            shared,
            sent_packets: 0,
            observed_packets: 0,
            acked_frames_since_telemetry: 0,
            last_telemetry_at: Instant::now(),
            fatal_error: None,
        }
    }

    /// Runs until the shared stop flag is set. Returns the fatal socket
    /// error that caused the stop, if any was observed by this worker (as
    /// opposed to being set by some other means).
    pub fn run(mut self) -> Result<(), io::Error> {
        let mut recv_buf = [0u8; MTU];
        while !self.shared.is_stopped() {
            self.poll_inbound(&mut recv_buf);
            self.drain_queue();
            // Idempotent with the purge already triggered by an inbound
            // report; cheap to repeat and bounds memory when reports are
            // infrequent.
            self.retention.purge_up_to(self.shared.latest_receiver_ack());
        }
        match self.fatal_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn poll_inbound(&mut self, buf: &mut [u8]) {
        let (len, from) = match self.socket.recv_from(buf) {
            Ok(pair) => pair,
            Err(err) if is_transient(&err) => return,
            Err(err) => {
                tracing::error!(error = %err, "fatal socket error in sender worker");
                self.fatal_error = Some(err);
                self.shared.stop();
                return;
            }
        };
        // Only the endpoint captured at bootstrap is a valid peer; anything
        // else is silently discarded (this is the session-isolation check
        // for receiver -> sender traffic, which carries no session id field
        // of its own on the wire).
        if from != self.peer {
            return;
        }
        let datagram = &buf[..len];
        let message_type = match peek_message_type(datagram) {
            Ok(t) => t,
            Err(err) => {
                tracing::warn!(error = %err, "dropping malformed datagram from receiver");
                return;
            }
        };
        match message_type {
            MessageType::Report => self.handle_report(&datagram[1..]),
            MessageType::Nack => self.handle_nack(&datagram[1..]),
            other => {
                tracing::warn!(?other, "unexpected message type from receiver, ignoring");
            }
        }
    }

    fn handle_report(&mut self, body: &[u8]) {
        let report = match ReceiverReport::decode(body) {
            Ok(r) => r,
            Err(err) => {
                tracing::warn!(error = %err, "malformed receiver report");
                return;
            }
        };
        self.shared.set_latest_receiver_ack(report.frame_id);
        self.observed_packets += report.packet_count as u64;

        let rtt = self.send_time.rtt(report.frame_id, Instant::now());
        tracing::debug!(
            frame_id = %report.frame_id,
            packet_collection_ms = report.packet_collection_ms,
            decoder_ms = report.decoder_ms,
            rtt_ms = rtt.map(|d| d.as_secs_f64() * 1000.0),
            "received receiver report"
        );

        self.send_time.purge_up_to(report.frame_id);
        self.retention.purge_up_to(report.frame_id);

        self.acked_frames_since_telemetry += 1;
        if self.acked_frames_since_telemetry >= TELEMETRY_INTERVAL_FRAMES {
            self.emit_telemetry();
        }
    }

    fn handle_nack(&mut self, body: &[u8]) {
        let nack = match Nack::decode(body) {
            Ok(n) => n,
            Err(err) => {
                tracing::warn!(error = %err, "malformed NACK");
                return;
            }
        };
        for index in &nack.missing {
            let Some(packet) = self.retention.get_data_packet(nack.frame_id, *index) else {
                tracing::debug!(frame_id = %nack.frame_id, index, "NACK for a purged frame, ignoring");
                continue;
            };
            self.send_packet(&packet.encode());
        }
    }

    fn drain_queue(&mut self) {
        while let Ok(set) = self.queue_rx.try_recv() {
            self.send_time.record(set.frame_id, Instant::now());
            for packet in &set.data_packets {
                self.send_packet(&packet.encode());
            }
            for packet in &set.xor_packets {
                self.send_packet(&packet.encode());
            }
            self.retention.insert(set);
        }
    }

    fn send_packet(&mut self, bytes: &[u8]) {
        match self.socket.send_to(bytes, self.peer) {
            Ok(_) => self.sent_packets += 1,
            Err(err) if is_transient(&err) => {
                tracing::debug!("send would block, dropping packet for this iteration");
            }
            Err(err) => {
                tracing::error!(error = %err, "fatal socket error sending to receiver");
                self.fatal_error = Some(err);
                self.shared.stop();
            }
        }
    }

    fn emit_telemetry(&mut self) {
        let elapsed = self.last_telemetry_at.elapsed();
        let fps = if elapsed.as_secs_f64() > 0.0 {
            self.acked_frames_since_telemetry as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };
        let loss_ratio = if self.sent_packets > 0 {
            1.0 - (self.observed_packets as f64 / self.sent_packets as f64)
        } else {
            0.0
        };
        tracing::info!(
            fps,
            loss_ratio,
            sent_packets = self.sent_packets,
            observed_packets = self.observed_packets,
            "send summary"
        );
        self.acked_frames_since_telemetry = 0;
        self.last_telemetry_at = Instant::now();
    }
}
