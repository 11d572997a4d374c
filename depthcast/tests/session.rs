//! Full sender/receiver integration tests over real loopback UDP sockets,
//! exercising the happy path, loss recovery, and retention/ack behavior
//! end to end rather than through any single crate's unit tests.

use std::thread;
use std::time::{Duration, Instant};

use bytes::Bytes;
use dcbase::{FrameId, SessionId, fec, fragment};
use dcrecovery::{ArcRetentionMap, ArcSendTimeMap, FramePacketSet};
use depthcast::bootstrap::{receiver_bootstrap, sender_bootstrap};
use depthcast::queue::frame_queue;
use depthcast::reassembler::Reassembler;
use depthcast::sender_worker::SenderWorker;
use depthcast::shared_state::SharedState;
use dcudp::DcSocket;

const TEST_TIMEOUT: Duration = Duration::from_secs(5);

fn make_frame(session_id: SessionId, frame_id: FrameId, payload: &[u8]) -> FramePacketSet {
    let message = Bytes::copy_from_slice(payload);
    let data_packets = fragment::fragment_message(session_id, frame_id, &message);
    let xor_packets = fec::build_xor_packets(session_id, frame_id, &data_packets);
    FramePacketSet {
        frame_id,
        data_packets,
        xor_packets,
    }
}

/// A frame message large enough to span several data packets and XOR
/// groups.
fn sample_payload() -> Vec<u8> {
    vec![0xABu8; dcbase::constants::MAX_DATA_PAYLOAD * 2 + 50]
}

/// Bootstraps a sender/receiver pair over loopback, returning both sockets
/// already bound to each other's addresses plus the shared session id.
fn bootstrap_pair() -> (DcSocket, DcSocket, SessionId) {
    let sender_socket = DcSocket::bind("127.0.0.1:0").unwrap();
    let receiver_socket = DcSocket::bind("127.0.0.1:0").unwrap();
    let receiver_addr = receiver_socket.local_addr().unwrap();
    let sender_addr = sender_socket.local_addr().unwrap();

    let session_id = SessionId::from(12345);
    let calibration_blob = Bytes::from_static(b"test-calibration-blob");

    let sender_thread = thread::spawn(move || {
        sender_bootstrap(&sender_socket, session_id, calibration_blob).map(|peer| (sender_socket, peer))
    });

    let (received_session, _blob) = receiver_bootstrap(&receiver_socket, sender_addr).unwrap();
    assert_eq!(received_session, session_id);

    let (sender_socket, peer) = sender_thread.join().unwrap().unwrap();
    assert_eq!(peer, receiver_addr);
    (sender_socket, receiver_socket, session_id)
}

/// Drains `receiver_socket` into `reassembler`, sending a report for every
/// newly completed frame back to `sender_addr`, until `frames_expected`
/// distinct frames have been reported or the deadline passes.
fn run_receiver_loop(
    receiver_socket: &DcSocket,
    reassembler: &mut Reassembler,
    sender_addr: std::net::SocketAddr,
    frames_expected: usize,
) -> Vec<FrameId> {
    let deadline = Instant::now() + TEST_TIMEOUT;
    let mut completed_ids = Vec::new();
    let mut buf = [0u8; dcbase::constants::MTU];
    while completed_ids.len() < frames_expected && Instant::now() < deadline {
        match receiver_socket.recv_from(&mut buf) {
            Ok((len, _)) => {
                let _ = reassembler.ingest(&buf[..len]);
                for completed in reassembler.take_completed() {
                    let report = dcbase::ReceiverReport {
                        frame_id: completed.frame_id,
                        packet_collection_ms: completed.packet_collection_ms,
                        decoder_ms: completed.decoder_ms,
                        frame_timestamp_ms: completed.message.frame_timestamp_ms,
                        packet_count: completed.packet_count,
                    };
                    receiver_socket.send_to(&report.encode(), sender_addr).unwrap();
                    completed_ids.push(completed.frame_id);
                }
            }
            Err(err) if dcudp::is_transient(&err) => thread::sleep(Duration::from_millis(2)),
            Err(err) => panic!("unexpected receive error: {err}"),
        }
    }
    completed_ids
}

#[test]
fn happy_path_all_frames_delivered_and_retention_drains() {
    let (sender_socket, receiver_socket, session_id) = bootstrap_pair();
    let sender_addr = sender_socket.local_addr().unwrap();
    let receiver_addr = receiver_socket.local_addr().unwrap();

    let shared = SharedState::new();
    let retention = ArcRetentionMap::new();
    let send_time = ArcSendTimeMap::new();
    let (queue_tx, queue_rx) = frame_queue();

    for i in 0..10 {
        let frame = make_frame(session_id, FrameId::from(i), &sample_payload());
        queue_tx.try_send(frame).unwrap();
    }

    let worker = SenderWorker::new(
        sender_socket,
        receiver_addr,
        retention.clone(),
        send_time,
        queue_rx,
        shared.clone(),
    );
    let worker_thread = thread::spawn(move || worker.run());

    let mut reassembler = Reassembler::new(session_id);
    let completed = run_receiver_loop(&receiver_socket, &mut reassembler, sender_addr, 10);
    assert_eq!(completed.len(), 10, "all ten frames should be reassembled");

    // Give the worker a moment to process the final ack before checking
    // retention and stopping it.
    let deadline = Instant::now() + TEST_TIMEOUT;
    while !retention.is_empty() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
    assert!(retention.is_empty(), "retention should drain once frame 9 is acked");

    shared.stop();
    worker_thread.join().unwrap().unwrap();
}

#[test]
fn single_packet_loss_is_recovered_by_xor_without_nack() {
    let (sender_socket, receiver_socket, session_id) = bootstrap_pair();
    let sender_addr = sender_socket.local_addr().unwrap();
    let receiver_addr = receiver_socket.local_addr().unwrap();

    // Drive the wire directly instead of through SenderWorker: drop data
    // packet index 1 of every frame before it ever reaches the socket.
    let frame = make_frame(session_id, FrameId::from(0), &sample_payload());
    assert!(frame.data_packets.len() > 1, "test needs a multi-packet frame");

    for (i, pkt) in frame.data_packets.iter().enumerate() {
        if i == 1 {
            continue;
        }
        sender_socket.send_to(&pkt.encode(), receiver_addr).unwrap();
    }
    for pkt in &frame.xor_packets {
        sender_socket.send_to(&pkt.encode(), receiver_addr).unwrap();
    }

    let mut reassembler = Reassembler::new(session_id);
    let completed = run_receiver_loop(&receiver_socket, &mut reassembler, sender_addr, 1);
    assert_eq!(completed.len(), 1);
    assert!(
        reassembler.pending_nacks().is_empty(),
        "XOR recovery must avoid any NACK"
    );
}

#[test]
fn two_packet_loss_in_one_group_triggers_nack_then_retransmit() {
    let (sender_socket, receiver_socket, session_id) = bootstrap_pair();
    let sender_addr = sender_socket.local_addr().unwrap();
    let receiver_addr = receiver_socket.local_addr().unwrap();

    let shared = SharedState::new();
    let retention = ArcRetentionMap::new();
    let send_time = ArcSendTimeMap::new();
    let (queue_tx, queue_rx) = frame_queue();

    let payload = vec![0x5Au8; dcbase::constants::MAX_DATA_PAYLOAD * 4];
    let frame = make_frame(session_id, FrameId::from(7), &payload);
    assert!(frame.data_packets.len() >= 3, "test needs at least 3 data packets");
    queue_tx.try_send(frame).unwrap();

    let worker = SenderWorker::new(
        sender_socket,
        receiver_addr,
        retention,
        send_time,
        queue_rx,
        shared.clone(),
    );
    let worker_thread = thread::spawn(move || worker.run());

    // Act as a receiver that drops the first sighting of indices 1 and 2,
    // NACKs them once both first sightings have been dropped, then accepts
    // the retransmission.
    let mut buf = [0u8; dcbase::constants::MTU];
    let mut have: std::collections::BTreeSet<i32> = std::collections::BTreeSet::new();
    let mut dropped_once: std::collections::BTreeSet<i32> = std::collections::BTreeSet::new();
    let mut nacked = false;
    let deadline = Instant::now() + TEST_TIMEOUT;
    while have.len() < 4 && Instant::now() < deadline {
        match receiver_socket.recv_from(&mut buf) {
            Ok((len, _)) => {
                if let Ok(dcbase::MessageType::Data) = dcbase::peek_message_type(&buf[..len]) {
                    let pkt = dcbase::DataPacket::decode(Bytes::copy_from_slice(&buf[1..len])).unwrap();
                    if (pkt.packet_index == 1 || pkt.packet_index == 2) && dropped_once.insert(pkt.packet_index) {
                        continue;
                    }
                    have.insert(pkt.packet_index);
                }
                if dropped_once.len() == 2 && !nacked {
                    let nack = dcbase::Nack {
                        frame_id: FrameId::from(7),
                        missing: vec![1, 2],
                    };
                    receiver_socket.send_to(&nack.encode(), sender_addr).unwrap();
                    nacked = true;
                }
            }
            Err(err) if dcudp::is_transient(&err) => thread::sleep(Duration::from_millis(2)),
            Err(err) => panic!("unexpected receive error: {err}"),
        }
    }
    assert!(nacked, "both members of the group must have been dropped once to trigger a NACK");
    assert_eq!(have, (0..4).collect(), "all four data packets should eventually arrive");

    shared.stop();
    worker_thread.join().unwrap().unwrap();
}

#[test]
fn ack_purges_retention_up_to_and_including_acked_frame() {
    let (sender_socket, receiver_socket, session_id) = bootstrap_pair();
    let sender_addr = sender_socket.local_addr().unwrap();
    let receiver_addr = receiver_socket.local_addr().unwrap();

    let shared = SharedState::new();
    let retention = ArcRetentionMap::new();
    let send_time = ArcSendTimeMap::new();
    let (queue_tx, queue_rx) = frame_queue();

    for i in 0..=20 {
        let frame = make_frame(session_id, FrameId::from(i), b"x");
        queue_tx.try_send(frame).unwrap();
    }

    let worker = SenderWorker::new(
        sender_socket,
        receiver_addr,
        retention.clone(),
        send_time,
        queue_rx,
        shared.clone(),
    );
    let worker_thread = thread::spawn(move || worker.run());

    // Give the worker a chance to drain the queue into retention before
    // sending the ack.
    let deadline = Instant::now() + TEST_TIMEOUT;
    while retention.len() < 21 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(retention.len(), 21);

    let report = dcbase::ReceiverReport {
        frame_id: FrameId::from(15),
        packet_collection_ms: 1.0,
        decoder_ms: 1.0,
        frame_timestamp_ms: 1.0,
        packet_count: 1,
    };
    receiver_socket.send_to(&report.encode(), sender_addr).unwrap();

    let deadline = Instant::now() + TEST_TIMEOUT;
    while retention.len() != 5 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(retention.len(), 5, "frames 16..=20 should remain after acking 15");
    for id in 0..=15 {
        assert!(!retention.contains(FrameId::from(id)));
    }
    for id in 16..=20 {
        assert!(retention.contains(FrameId::from(id)));
    }

    shared.stop();
    worker_thread.join().unwrap().unwrap();
}

#[test]
fn session_mismatch_never_mutates_receiver_state() {
    let (_sender_socket, _receiver_socket, session_id) = bootstrap_pair();
    let wrong_session = SessionId::from(session_id.into_inner().wrapping_add(1));

    let mut reassembler = Reassembler::new(session_id);
    let frame = make_frame(wrong_session, FrameId::from(0), b"mismatch");
    for pkt in &frame.data_packets {
        assert!(reassembler.ingest(&pkt.encode()).is_err());
    }
    assert_eq!(reassembler.frame_count(), 0);
}
