use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::thread;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use dcbase::constants::{MAX_INIT_PAYLOAD, MTU};
use dcbase::{InitFragment, MessageType, Ping, SessionId, peek_message_type};
use dcudp::{DcSocket, is_transient};

use crate::error::SessionError;

/// How long to sleep between non-blocking poll attempts while waiting for
/// the handshake datagram. Bootstrap has no deadline (timeouts are out of
/// scope), so this only bounds CPU spin, not wall-clock wait time.
const POLL_INTERVAL: Duration = Duration::from_millis(5);

fn split_init_fragments(session_id: SessionId, blob: &Bytes) -> Vec<InitFragment> {
    let chunks: Vec<Bytes> = if blob.is_empty() {
        vec![Bytes::new()]
    } else {
        blob.chunks(MAX_INIT_PAYLOAD)
            .map(|chunk| blob.slice_ref(chunk))
            .collect()
    };
    let fragment_count = chunks.len() as i32;
    chunks
        .into_iter()
        .enumerate()
        .map(|(index, payload)| InitFragment {
            session_id,
            fragment_index: index as i32,
            fragment_count,
            payload,
        })
        .collect()
}

/// Waits for the receiver's ping, binding the sender to that peer, then
/// transmits the init datagram(s) carrying `session_id` and the
/// calibration blob, splitting it across packets if it exceeds the MTU.
///
/// Blocks indefinitely until a ping arrives: bootstrap timeouts are out of
/// scope for this protocol.
pub fn sender_bootstrap(
    socket: &DcSocket,
    session_id: SessionId,
    calibration_blob: Bytes,
) -> Result<SocketAddr, SessionError> {
    let mut buf = [0u8; MTU];
    let peer = loop {
        match socket.recv_from(&mut buf) {
            Ok((len, from)) => {
                if peek_message_type(&buf[..len]).ok() == Some(MessageType::Ping) {
                    break from;
                }
                tracing::debug!(%from, "ignoring non-ping datagram before bootstrap");
            }
            Err(err) if is_transient(&err) => thread::sleep(POLL_INTERVAL),
            Err(err) => return Err(SessionError::FatalSocket(err)),
        }
    };

    for fragment in split_init_fragments(session_id, &calibration_blob) {
        socket
            .send_to(&fragment.encode(), peer)
            .map_err(SessionError::FatalSocket)?;
    }
    Ok(peer)
}

/// Sends a ping to `sender_addr`, then waits for and assembles the init
/// fragments into the session id and calibration blob.
pub fn receiver_bootstrap(socket: &DcSocket, sender_addr: SocketAddr) -> Result<(SessionId, Bytes), SessionError> {
    socket
        .send_to(&Ping::encode(), sender_addr)
        .map_err(SessionError::FatalSocket)?;

    let mut buf = [0u8; MTU];
    let mut fragments: BTreeMap<i32, Bytes> = BTreeMap::new();
    let mut fragment_count: Option<i32> = None;
    let mut session_id: Option<SessionId> = None;

    loop {
        match socket.recv_from(&mut buf) {
            Ok((len, from)) if from == sender_addr => {
                let datagram = &buf[..len];
                if peek_message_type(datagram).ok() != Some(MessageType::Init) {
                    continue;
                }
                let body = Bytes::copy_from_slice(&datagram[1..]);
                let Ok(fragment) = InitFragment::decode(body) else {
                    continue;
                };
                session_id.get_or_insert(fragment.session_id);
                fragment_count.get_or_insert(fragment.fragment_count);
                fragments.entry(fragment.fragment_index).or_insert(fragment.payload);

                if let Some(count) = fragment_count {
                    if fragments.len() == count as usize {
                        let mut blob = BytesMut::new();
                        for i in 0..count {
                            if let Some(chunk) = fragments.get(&i) {
                                blob.extend_from_slice(chunk);
                            }
                        }
                        return Ok((session_id.unwrap(), blob.freeze()));
                    }
                }
            }
            Ok(_) => continue,
            Err(err) if is_transient(&err) => thread::sleep(POLL_INTERVAL),
            Err(err) => return Err(SessionError::FatalSocket(err)),
        }
    }
}
