//! Sender-side bookkeeping: the retention map of recently transmitted
//! frames, the send-time map used for round-trip measurement, and the
//! pacing/keyframe decision driven by receiver feedback.

pub mod pacer;
pub mod retention;
pub mod send_time;

pub use pacer::Pacer;
pub use retention::{ArcRetentionMap, FramePacketSet};
pub use send_time::ArcSendTimeMap;
