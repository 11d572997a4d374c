use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use dcbase::FrameId;

/// Timestamp of when a frame's first packet was handed to the socket, kept
/// only long enough to compute the round trip when its ack arrives.
#[derive(Debug, Default, Clone)]
pub struct ArcSendTimeMap(Arc<Mutex<BTreeMap<FrameId, Instant>>>);

impl ArcSendTimeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, frame_id: FrameId, sent_at: Instant) {
        self.0.lock().unwrap().insert(frame_id, sent_at);
    }

    /// Time elapsed between `record`ing `frame_id` and `now`. `None` if the
    /// frame was never recorded, or its entry was already purged by an
    /// earlier ack.
    pub fn rtt(&self, frame_id: FrameId, now: Instant) -> Option<Duration> {
        self.0
            .lock()
            .unwrap()
            .get(&frame_id)
            .map(|sent_at| now.saturating_duration_since(*sent_at))
    }

    pub fn purge_up_to(&self, ack: FrameId) {
        let mut inner = self.0.lock().unwrap();
        let keep = inner.split_off(&ack.next());
        *inner = keep;
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
