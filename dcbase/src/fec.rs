use bytes::{Bytes, BytesMut};

use crate::{
    constants::MAX_XOR_GROUP,
    packet::{DataPacket, XorPacket},
    session::{FrameId, SessionId},
};

/// Build the XOR parity packets for one frame's data packets.
///
/// Groups are consecutive runs of up to [`MAX_XOR_GROUP`] packets. Each
/// member's payload is zero-padded to the group's longest member before the
/// bytewise XOR, and the parity packet carries `(group_start, group_length)`
/// so the receiver knows which indices it covers.
pub fn build_xor_packets(
    session_id: SessionId,
    frame_id: FrameId,
    data_packets: &[DataPacket],
) -> Vec<XorPacket> {
    data_packets
        .chunks(MAX_XOR_GROUP)
        .enumerate()
        .map(|(group_idx, group)| {
            let group_start = (group_idx * MAX_XOR_GROUP) as i32;
            let max_len = group.iter().map(|p| p.payload.len()).max().unwrap_or(0);
            let mut parity = vec![0u8; max_len];
            for member in group {
                for (byte, payload_byte) in parity.iter_mut().zip(member.payload.iter()) {
                    *byte ^= payload_byte;
                }
            }
            XorPacket {
                session_id,
                frame_id,
                group_start,
                group_length: group.len() as i32,
                parity: Bytes::from(parity),
            }
        })
        .collect()
}

/// Number of XOR groups (and thus parity packets) for `n` data packets:
/// `ceil(n / MAX_XOR_GROUP)`.
pub fn xor_group_count(n: usize) -> usize {
    n.div_ceil(MAX_XOR_GROUP)
}

/// Recover one missing member of an XOR group given the parity packet and
/// every other member of the group, each paired with its true payload
/// length.
///
/// Returns `None` if more than one member is missing (unrecoverable), or if
/// the missing member is not uniquely determined.
///
/// `members` has exactly `group_length` slots; the one `None` slot is the
/// packet being reconstructed. Every `Some` payload must already be
/// zero-padded to `parity.len()` by the caller, matching the encoder's
/// padding rule.
pub fn recover_missing(parity: &[u8], members: &[Option<Bytes>], recovered_len: usize) -> Option<Bytes> {
    let missing_count = members.iter().filter(|m| m.is_none()).count();
    if missing_count != 1 {
        return None;
    }
    let mut recovered = BytesMut::from(parity);
    for member in members.iter().flatten() {
        for (byte, payload_byte) in recovered.iter_mut().zip(member.iter()) {
            *byte ^= payload_byte;
        }
    }
    recovered.truncate(recovered_len);
    Some(recovered.freeze())
}
