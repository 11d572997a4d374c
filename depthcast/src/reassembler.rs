use std::collections::BTreeMap;
use std::time::Instant;

use bytes::Bytes;
use dcbase::{DataPacket, Error, FrameId, FrameMessage, MessageType, SessionId, XorPacket, fec, peek_message_type};

#[derive(Debug)]
struct FrameState {
    packet_count: Option<i32>,
    data: BTreeMap<i32, Bytes>,
    xor_groups: Vec<(i32, i32, Bytes)>,
    report_emitted: bool,
    last_touched: Instant,
    first_touched: Instant,
    /// Packets actually received off the wire for this frame (data and
    /// XOR), as opposed to `data.len()` which also counts members filled
    /// in by XOR recovery. This is what a receiver report's `packet_count`
    /// reflects, so the sender's loss-ratio telemetry means what it says.
    observed_packets: u32,
}

impl FrameState {
    fn new() -> Self {
        let now = Instant::now();
        Self {
            packet_count: None,
            data: BTreeMap::new(),
            xor_groups: Vec::new(),
            report_emitted: false,
            last_touched: now,
            first_touched: now,
            observed_packets: 0,
        }
    }

    fn insert_data(&mut self, index: i32, count: i32, payload: Bytes) {
        self.packet_count.get_or_insert(count);
        if let std::collections::btree_map::Entry::Vacant(entry) = self.data.entry(index) {
            entry.insert(payload);
            self.observed_packets += 1;
        }
        self.last_touched = Instant::now();
    }

    fn insert_xor(&mut self, group_start: i32, group_length: i32, parity: Bytes) {
        let already_seen = self
            .xor_groups
            .iter()
            .any(|(s, l, _)| *s == group_start && *l == group_length);
        if !already_seen {
            self.xor_groups.push((group_start, group_length, parity));
            self.observed_packets += 1;
        }
        self.last_touched = Instant::now();
    }

    fn is_complete(&self) -> bool {
        matches!(self.packet_count, Some(n) if self.data.len() == n as usize)
    }

    /// Reconstruct any group with exactly one missing member, unless that
    /// member is the frame's terminal (possibly short) packet: its true
    /// length is never encoded on the wire, so the XOR header alone can't
    /// tell a receiver how far to truncate the recovered bytes. Groups
    /// don't overlap in this protocol, so one pass over all groups is
    /// enough; nothing a later insert does within this call can unblock an
    /// earlier group.
    fn try_recover(&mut self) {
        let Some(packet_count) = self.packet_count else {
            return;
        };
        let terminal_index = packet_count - 1;
        for (group_start, group_length, parity) in &self.xor_groups {
            let indices: Vec<i32> = (*group_start..*group_start + *group_length).collect();
            let missing: Vec<i32> = indices
                .iter()
                .copied()
                .filter(|i| !self.data.contains_key(i))
                .collect();
            if missing.len() != 1 {
                continue;
            }
            let missing_index = missing[0];
            if missing_index == terminal_index {
                continue;
            }
            let members: Vec<Option<Bytes>> = indices.iter().map(|i| self.data.get(i).cloned()).collect();
            if let Some(recovered) = fec::recover_missing(parity, &members, parity.len()) {
                self.data.insert(missing_index, recovered);
            }
        }
    }

    fn missing_indices(&self) -> Vec<i32> {
        let Some(packet_count) = self.packet_count else {
            return Vec::new();
        };
        (0..packet_count).filter(|i| !self.data.contains_key(i)).collect()
    }

    fn reassemble(&self) -> Option<Bytes> {
        let packet_count = self.packet_count?;
        if self.data.len() != packet_count as usize {
            return None;
        }
        let mut buf = Vec::new();
        for i in 0..packet_count {
            buf.extend_from_slice(self.data.get(&i)?);
        }
        Some(Bytes::from(buf))
    }
}

/// A frame whose fragments have all arrived (directly or via XOR
/// recovery), ready to report back to the sender.
#[derive(Debug)]
pub struct CompletedFrame {
    pub frame_id: FrameId,
    pub message: FrameMessage,
    pub packet_collection_ms: f32,
    pub decoder_ms: f32,
    pub packet_count: i32,
}

/// Accumulates fragments per frame id, recovers missing fragments via XOR
/// when possible, and tracks what still needs a NACK.
///
/// The receiver never blocks on out-of-order frames: a frame id older than
/// the most recently completed one may still complete opportunistically,
/// but its report is only ever emitted once.
pub struct Reassembler {
    expected_session: SessionId,
    frames: BTreeMap<FrameId, FrameState>,
    highest_completed: Option<FrameId>,
}

impl Reassembler {
    pub fn new(expected_session: SessionId) -> Self {
        Self {
            expected_session,
            frames: BTreeMap::new(),
            highest_completed: None,
        }
    }

    /// Feed in one datagram's bytes, `datagram[0]` being the message type.
    /// Only `Data` and `Xor` packets are meaningful here; anything else
    /// (or a session id mismatch) is a protocol violation the caller
    /// should log and discard, never let mutate state.
    pub fn ingest(&mut self, datagram: &[u8]) -> Result<(), Error> {
        let message_type = peek_message_type(datagram)?;
        let body = Bytes::copy_from_slice(&datagram[1..]);
        match message_type {
            MessageType::Data => {
                let pkt = DataPacket::decode(body)?;
                self.check_session(pkt.session_id)?;
                let frame = self.frames.entry(pkt.frame_id).or_insert_with(FrameState::new);
                frame.insert_data(pkt.packet_index, pkt.packet_count, pkt.payload);
                frame.try_recover();
                Ok(())
            }
            MessageType::Xor => {
                let pkt = XorPacket::decode(body)?;
                self.check_session(pkt.session_id)?;
                let frame = self.frames.entry(pkt.frame_id).or_insert_with(FrameState::new);
                frame.insert_xor(pkt.group_start, pkt.group_length, pkt.parity);
                frame.try_recover();
                Ok(())
            }
            other => Err(Error::UnexpectedMessageType {
                expected: MessageType::Data,
                actual: other,
            }),
        }
    }

    fn check_session(&self, session_id: SessionId) -> Result<(), Error> {
        if session_id != self.expected_session {
            return Err(Error::SessionMismatch {
                expected: self.expected_session.into_inner(),
                actual: session_id.into_inner(),
            });
        }
        Ok(())
    }

    /// Drain frames that completed since the last call, reassembled into
    /// their [`FrameMessage`] along with the timing and packet-count data
    /// a receiver report carries. Each frame is returned at most once.
    pub fn take_completed(&mut self) -> Vec<CompletedFrame> {
        let mut completed = Vec::new();
        for (&frame_id, state) in self.frames.iter_mut() {
            if state.report_emitted || !state.is_complete() {
                continue;
            }
            let Some(bytes) = state.reassemble() else {
                continue;
            };
            state.report_emitted = true;
            let packet_collection_ms = state.last_touched.duration_since(state.first_touched).as_secs_f32() * 1000.0;
            let decode_start = Instant::now();
            match FrameMessage::decode(bytes) {
                Ok(message) => {
                    let decoder_ms = decode_start.elapsed().as_secs_f32() * 1000.0;
                    if self.highest_completed.map_or(true, |h| frame_id > h) {
                        self.highest_completed = Some(frame_id);
                    }
                    completed.push(CompletedFrame {
                        frame_id,
                        message,
                        packet_collection_ms,
                        decoder_ms,
                        packet_count: state.observed_packets as i32,
                    });
                }
                Err(err) => {
                    tracing::warn!(%frame_id, error = %err, "reassembled frame failed to decode");
                }
            }
        }
        completed
    }

    /// Missing-index NACKs for every incomplete frame older than the
    /// newest completed frame. Nothing is produced until at least one
    /// frame has completed, since "older than the newest complete frame"
    /// otherwise has no meaning.
    pub fn pending_nacks(&self) -> Vec<(FrameId, Vec<i32>)> {
        let Some(boundary) = self.highest_completed else {
            return Vec::new();
        };
        self.frames
            .iter()
            .filter(|(&frame_id, state)| frame_id < boundary && !state.is_complete())
            .filter_map(|(&frame_id, state)| {
                let missing = state.missing_indices();
                (!missing.is_empty()).then_some((frame_id, missing))
            })
            .collect()
    }

    /// Drop retained state for frames at or below `frame_id`: they can no
    /// longer usefully complete or be worth NACKing.
    pub fn evict_up_to(&mut self, frame_id: FrameId) {
        self.frames.retain(|&id, _| id > frame_id);
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// The highest frame id completed so far, if any.
    pub fn highest_completed(&self) -> Option<FrameId> {
        self.highest_completed
    }
}

#[cfg(test)]
mod tests {
    use dcbase::fragment::fragment_message;

    use super::*;

    fn session() -> SessionId {
        SessionId::from(7)
    }

    #[test]
    fn reassembles_in_arbitrary_order_without_loss() {
        let mut reassembler = Reassembler::new(session());
        let message = FrameMessage {
            frame_timestamp_ms: 12.0,
            keyframe: false,
            color: Bytes::from_static(b"color"),
            depth: Bytes::from_static(b"depth"),
        }
        .encode();
        let mut packets = fragment_message(session(), FrameId::from(0), &message);
        packets.reverse();
        for pkt in packets {
            reassembler.ingest(&pkt.encode()).unwrap();
        }
        let completed = reassembler.take_completed();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].frame_id, FrameId::from(0));
    }

    #[test]
    fn session_mismatch_does_not_mutate_state() {
        let mut reassembler = Reassembler::new(session());
        let message = FrameMessage {
            frame_timestamp_ms: 0.0,
            keyframe: false,
            color: Bytes::from_static(b"c"),
            depth: Bytes::from_static(b"d"),
        }
        .encode();
        let packets = fragment_message(SessionId::from(999), FrameId::from(0), &message);
        for pkt in &packets {
            assert!(reassembler.ingest(&pkt.encode()).is_err());
        }
        assert_eq!(reassembler.frame_count(), 0);
    }

    #[test]
    fn single_missing_packet_recovered_by_xor_without_nack() {
        let mut reassembler = Reassembler::new(session());
        let message = FrameMessage {
            frame_timestamp_ms: 0.0,
            keyframe: true,
            color: Bytes::from(vec![9u8; 4000]),
            depth: Bytes::from(vec![4u8; 10]),
        }
        .encode();
        let data_packets = fragment_message(session(), FrameId::from(3), &message);
        let xor_packets = dcbase::fec::build_xor_packets(session(), FrameId::from(3), &data_packets);
        assert!(data_packets.len() > 1, "test needs a multi-packet frame");

        for (i, pkt) in data_packets.iter().enumerate() {
            if i == 1 {
                continue; // drop index 1
            }
            reassembler.ingest(&pkt.encode()).unwrap();
        }
        for pkt in &xor_packets {
            reassembler.ingest(&pkt.encode()).unwrap();
        }
        let completed = reassembler.take_completed();
        assert_eq!(completed.len(), 1);
        assert!(reassembler.pending_nacks().is_empty());
    }
}
