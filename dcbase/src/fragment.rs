use bytes::Bytes;

use crate::{
    constants::MAX_DATA_PAYLOAD,
    packet::DataPacket,
    session::{FrameId, SessionId},
};

/// Split a compressed frame message into MTU-sized [`DataPacket`]s, numbered
/// `0..N-1` with `packet_count` fixed to `N` in every header.
///
/// An empty `message` still yields exactly one (empty-payload) packet, so
/// that a frame is never represented by zero packets.
pub fn fragment_message(session_id: SessionId, frame_id: FrameId, message: &Bytes) -> Vec<DataPacket> {
    let chunks: Vec<Bytes> = if message.is_empty() {
        vec![Bytes::new()]
    } else {
        message
            .chunks(MAX_DATA_PAYLOAD)
            .map(|chunk| message.slice_ref(chunk))
            .collect()
    };
    let packet_count = chunks.len() as i32;
    chunks
        .into_iter()
        .enumerate()
        .map(|(index, payload)| DataPacket {
            session_id,
            frame_id,
            packet_index: index as i32,
            packet_count,
            payload,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MAX_DATA_PAYLOAD;

    #[test]
    fn fragments_exactly_fit() {
        let message = Bytes::from(vec![7u8; MAX_DATA_PAYLOAD * 3]);
        let packets = fragment_message(SessionId::from(1), FrameId::from(0), &message);
        assert_eq!(packets.len(), 3);
        for (i, p) in packets.iter().enumerate() {
            assert_eq!(p.packet_index, i as i32);
            assert_eq!(p.packet_count, 3);
            assert_eq!(p.payload.len(), MAX_DATA_PAYLOAD);
        }
    }

    #[test]
    fn fragments_with_remainder() {
        let message = Bytes::from(vec![1u8; MAX_DATA_PAYLOAD * 2 + 10]);
        let packets = fragment_message(SessionId::from(1), FrameId::from(0), &message);
        assert_eq!(packets.len(), 3);
        assert_eq!(packets[2].payload.len(), 10);
    }

    #[test]
    fn reassembles_to_original_bytes_in_arbitrary_order() {
        let message = Bytes::from(vec![3u8; MAX_DATA_PAYLOAD * 2 + 37]);
        let mut packets = fragment_message(SessionId::from(1), FrameId::from(0), &message);
        // shuffle deterministically
        packets.reverse();
        let count = packets[0].packet_count as usize;
        let mut ordered = vec![Bytes::new(); count];
        for p in packets {
            ordered[p.packet_index as usize] = p.payload;
        }
        let reassembled: Vec<u8> = ordered.into_iter().flatten().collect();
        assert_eq!(reassembled, message.to_vec());
    }

    #[test]
    fn empty_message_yields_one_packet() {
        let packets = fragment_message(SessionId::from(1), FrameId::from(0), &Bytes::new());
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].packet_count, 1);
        assert!(packets[0].payload.is_empty());
    }
}
