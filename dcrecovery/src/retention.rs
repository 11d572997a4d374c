use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use dcbase::{DataPacket, FrameId, XorPacket};

/// Everything produced for one frame: its data packets in transmission order
/// followed by its XOR parity packets, as handed off from the producer to
/// the network worker.
#[derive(Debug, Clone)]
pub struct FramePacketSet {
    pub frame_id: FrameId,
    pub data_packets: Vec<DataPacket>,
    pub xor_packets: Vec<XorPacket>,
}

#[derive(Debug, Default)]
struct Retention {
    frames: BTreeMap<FrameId, FramePacketSet>,
}

/// The sender's short-term store of recently transmitted frames, keyed by
/// frame id. A cloneable handle shared between the producer and network
/// worker threads; every clone refers to the same underlying map.
#[derive(Debug, Default, Clone)]
pub struct ArcRetentionMap(Arc<Mutex<Retention>>);

impl ArcRetentionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move a freshly transmitted frame's packets into the map.
    pub fn insert(&self, set: FramePacketSet) {
        let mut inner = self.0.lock().unwrap();
        inner.frames.insert(set.frame_id, set);
    }

    /// Remove every retained frame with id `<= ack`. Idempotent: calling this
    /// twice with the same or an older `ack` is a no-op the second time.
    pub fn purge_up_to(&self, ack: FrameId) {
        let mut inner = self.0.lock().unwrap();
        let keep = inner.frames.split_off(&ack.next());
        let purged = inner.frames.len();
        inner.frames = keep;
        if purged > 0 {
            tracing::debug!(purged, ack = %ack, "purged retained frames");
        }
    }

    /// Look up one data packet by frame id and index, for retransmission.
    /// Returns `None` if the frame has already been purged or retransmission
    /// was requested for an index beyond what was ever sent.
    pub fn get_data_packet(&self, frame_id: FrameId, index: i32) -> Option<DataPacket> {
        let inner = self.0.lock().unwrap();
        inner
            .frames
            .get(&frame_id)?
            .data_packets
            .get(index as usize)
            .cloned()
    }

    pub fn contains(&self, frame_id: FrameId) -> bool {
        self.0.lock().unwrap().frames.contains_key(&frame_id)
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap().frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use dcbase::SessionId;

    use super::*;

    fn sample_set(frame_id: i32) -> FramePacketSet {
        FramePacketSet {
            frame_id: FrameId::from(frame_id),
            data_packets: vec![DataPacket {
                session_id: SessionId::from(1),
                frame_id: FrameId::from(frame_id),
                packet_index: 0,
                packet_count: 1,
                payload: Bytes::from_static(b"x"),
            }],
            xor_packets: vec![],
        }
    }

    #[test]
    fn ack_purges_up_to_and_including_acked_frame() {
        let retention = ArcRetentionMap::new();
        for id in 0..=20 {
            retention.insert(sample_set(id));
        }
        retention.purge_up_to(FrameId::from(15));
        assert_eq!(retention.len(), 5);
        for id in 0..=15 {
            assert!(!retention.contains(FrameId::from(id)));
        }
        for id in 16..=20 {
            assert!(retention.contains(FrameId::from(id)));
        }
    }

    #[test]
    fn purge_is_idempotent() {
        let retention = ArcRetentionMap::new();
        retention.insert(sample_set(0));
        retention.purge_up_to(FrameId::from(0));
        retention.purge_up_to(FrameId::from(0));
        assert!(retention.is_empty());
    }

    #[test]
    fn retransmit_reads_without_removing() {
        let retention = ArcRetentionMap::new();
        retention.insert(sample_set(3));
        let pkt = retention.get_data_packet(FrameId::from(3), 0);
        assert!(pkt.is_some());
        assert!(retention.contains(FrameId::from(3)));
    }

    #[test]
    fn missing_frame_yields_none() {
        let retention = ArcRetentionMap::new();
        assert!(retention.get_data_packet(FrameId::from(1), 0).is_none());
    }
}
