//! Fixed protocol constants.
//!
//! These are invariant for the lifetime of the protocol; none of them are
//! configurable through a config file or CLI flag.

/// Target MTU in bytes. Payload budgets are derived from this minus a
/// packet kind's header size.
pub const MTU: usize = 1500;

/// Maximum number of consecutive data packets covered by one XOR group.
pub const MAX_XOR_GROUP: usize = 5;

/// Send buffer size requested on the sender's UDP socket.
pub const SEND_BUFFER_SIZE: usize = 1024 * 1024;

/// Default UDP port offered by the sender's CLI prompt.
pub const DEFAULT_PORT: u16 = 7777;

/// `frame_id_diff` strictly greater than this forces the next frame to be a
/// keyframe.
pub const KEYFRAME_THRESHOLD: i32 = 5;

/// Color encoder target bitrate, in kbps. Opaque to the core; carried only
/// as a default for `dcmedia` encoder implementations.
pub const COLOR_ENCODER_BITRATE_KBPS: u32 = 2000;

/// Depth encoder per-pixel change threshold.
pub const DEPTH_ENCODER_CHANGE_THRESHOLD: i16 = 10;

/// Depth encoder invalid-pixel run threshold.
pub const DEPTH_ENCODER_INVALID_THRESHOLD: i16 = 2;

/// Header size of a frame-data packet: type(1) + session_id(4) + frame_id(4)
/// + packet_index(4) + packet_count(4).
pub const DATA_HEADER_LEN: usize = 1 + 4 + 4 + 4 + 4;

/// Header size of an XOR packet: type(1) + session_id(4) + frame_id(4) +
/// group_start(4) + group_length(4).
pub const XOR_HEADER_LEN: usize = 1 + 4 + 4 + 4 + 4;

/// Header size of one init-packet fragment: type(1) + session_id(4) +
/// fragment_index(4) + fragment_count(4).
pub const INIT_HEADER_LEN: usize = 1 + 4 + 4 + 4;

/// Maximum payload carried by one frame-data packet.
pub const MAX_DATA_PAYLOAD: usize = MTU - DATA_HEADER_LEN;

/// Maximum payload carried by one init-packet fragment.
pub const MAX_INIT_PAYLOAD: usize = MTU - INIT_HEADER_LEN;
