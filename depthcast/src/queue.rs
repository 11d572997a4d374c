use crossbeam_channel::{Receiver, Sender, bounded};
use dcrecovery::FramePacketSet;

/// Frames worth of backlog the bounded hand-off queue tolerates. The
/// pacing rule keeps the producer from running far ahead of the network
/// worker, so a small fixed capacity is enough.
pub const QUEUE_CAPACITY: usize = 16;

pub type FrameQueueSender = Sender<FramePacketSet>;
pub type FrameQueueReceiver = Receiver<FramePacketSet>;

/// Build the bounded single-producer/single-consumer queue that hands
/// fragmented, FEC-encoded frames from the producer thread to the network
/// worker thread. Both ends are non-blocking (`try_send`/`try_recv`).
pub fn frame_queue() -> (FrameQueueSender, FrameQueueReceiver) {
    bounded(QUEUE_CAPACITY)
}
