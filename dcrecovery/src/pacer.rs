use dcbase::constants::KEYFRAME_THRESHOLD;

/// Adaptive frame-pacing and keyframe decisions driven by receiver feedback.
///
/// Tracks the device timestamp of the last *transmitted* capture, not
/// merely the last observed one: the pacing rule only holds when
/// `device_frame_diff` is measured between transmitted captures.
#[derive(Debug)]
pub struct Pacer {
    capture_interval_us: i64,
    last_sent_device_ts_us: Option<i64>,
}

impl Pacer {
    /// `capture_interval_us` is the device's native capture interval in
    /// microseconds; it varies by hardware and is never hardcoded.
    pub fn new(capture_interval_us: i64) -> Self {
        Self {
            capture_interval_us,
            last_sent_device_ts_us: None,
        }
    }

    /// Whether a capture observed at `device_timestamp_us`, with the
    /// producer currently `frame_id_diff` frames ahead of the receiver's
    /// last ack, should be transmitted.
    ///
    /// The first capture of a session is always transmitted: there is no
    /// prior transmitted timestamp to diff against.
    pub fn should_transmit(&self, frame_id_diff: i32, device_timestamp_us: i64) -> bool {
        let Some(last) = self.last_sent_device_ts_us else {
            return true;
        };
        let time_diff_us = (device_timestamp_us - last) as f64;
        let device_frame_diff = (time_diff_us / self.capture_interval_us as f64).round() as i64;
        let threshold = 2f64.powi(frame_id_diff - 3) as i64;
        device_frame_diff >= threshold
    }

    pub fn is_keyframe(frame_id_diff: i32) -> bool {
        frame_id_diff > KEYFRAME_THRESHOLD
    }

    pub fn record_transmission(&mut self, device_timestamp_us: i64) {
        self.last_sent_device_ts_us = Some(device_timestamp_us);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL_US: i64 = 33_000;

    #[test]
    fn first_capture_always_transmits() {
        let pacer = Pacer::new(INTERVAL_US);
        assert!(pacer.should_transmit(0, 0));
    }

    #[test]
    fn keyframe_threshold_matches_spec_constant() {
        assert!(!Pacer::is_keyframe(5));
        assert!(Pacer::is_keyframe(6));
    }

    #[test]
    fn pacing_requires_exponential_backlog_tolerance() {
        let mut pacer = Pacer::new(INTERVAL_US);
        pacer.record_transmission(0);
        // frame_id_diff = 5 => threshold = 2^(5-3) = 4 native intervals.
        let frame_id_diff = 5;
        let just_under = 3 * INTERVAL_US;
        assert!(!pacer.should_transmit(frame_id_diff, just_under));
        let exactly_enough = 4 * INTERVAL_US;
        assert!(pacer.should_transmit(frame_id_diff, exactly_enough));
    }

    #[test]
    fn small_frame_id_diff_allows_fractional_threshold() {
        let mut pacer = Pacer::new(INTERVAL_US);
        pacer.record_transmission(0);
        // frame_id_diff = 0 => threshold = 2^-3 = 0.125, satisfied immediately.
        assert!(pacer.should_transmit(0, 1));
    }
}
