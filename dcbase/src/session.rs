use std::fmt;

use rand::Rng;

/// Identifies one sender run. Chosen at random at sender startup and carried
/// on every sender→receiver packet; the receiver rejects anything that
/// doesn't match the session it was initialized with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(i32);

impl SessionId {
    /// Draw a new session id at random.
    pub fn generate() -> Self {
        Self(rand::rng().random())
    }

    pub fn into_inner(self) -> i32 {
        self.0
    }
}

impl From<i32> for SessionId {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

impl From<SessionId> for i32 {
    fn from(value: SessionId) -> Self {
        value.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotone, per-session frame counter assigned by the producer. Starts at
/// zero; retransmissions never introduce new ids, they only resend packets
/// already assigned to an existing [`FrameId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(i32);

impl FrameId {
    pub const ZERO: FrameId = FrameId(0);

    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// `self - other`, saturating at zero frames of difference never being
    /// negative in the producer's own accounting (the receiver ack can lag
    /// or, in principle, arrive for a frame not yet produced).
    pub fn diff(self, other: FrameId) -> i32 {
        self.0 - other.0
    }

    pub fn into_inner(self) -> i32 {
        self.0
    }
}

impl From<i32> for FrameId {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

impl From<FrameId> for i32 {
    fn from(value: FrameId) -> Self {
        value.0
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_id_diff_is_signed() {
        let a = FrameId::from(5);
        let b = FrameId::from(8);
        assert_eq!(a.diff(b), -3);
        assert_eq!(b.diff(a), 3);
    }

    #[test]
    fn frame_id_next_increments() {
        let a = FrameId::from(5);
        assert_eq!(a.next().into_inner(), 6);
    }

    #[test]
    fn session_id_generate_is_round_trippable() {
        let sid = SessionId::generate();
        let raw: i32 = sid.into();
        assert_eq!(SessionId::from(raw), sid);
    }
}
