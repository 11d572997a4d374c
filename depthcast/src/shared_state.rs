use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

use dcbase::FrameId;

/// Cross-thread advisory state: written by the network worker, read by the
/// producer for pacing heuristics and loop termination. Relaxed ordering is
/// enough because neither reader needs a happens-before relationship with
/// any other data; both only ever use these for "eventually visible" hints.
#[derive(Debug)]
pub struct SharedState {
    stop: AtomicBool,
    latest_receiver_ack: AtomicI32,
}

impl SharedState {
    /// `latest_receiver_ack` starts at `0`: until the first report arrives,
    /// the producer treats the receiver as caught up through frame zero.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            stop: AtomicBool::new(false),
            latest_receiver_ack: AtomicI32::new(0),
        })
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    pub fn latest_receiver_ack(&self) -> FrameId {
        FrameId::from(self.latest_receiver_ack.load(Ordering::Relaxed))
    }

    pub fn set_latest_receiver_ack(&self, frame_id: FrameId) {
        self.latest_receiver_ack
            .store(frame_id.into_inner(), Ordering::Relaxed);
    }
}
