//! Metric helpers for `gattwire`.
//!
//! This module defines metric names and simple helper functions wrapping the
//! [`metrics`](https://docs.rs/metrics) crate. Without the `metrics` feature
//! the helpers compile to nothing.

#[cfg(feature = "metrics")]
use metrics::counter;

/// Name of the counter tracking frames handed to or received from the transport.
pub const FRAMES_PROCESSED: &str = "gattwire_frames_processed_total";
/// Name of the counter tracking inbound frames discarded by reassembly.
pub const FRAMES_DROPPED: &str = "gattwire_frames_dropped_total";
/// Name of the counter tracking fully reassembled messages.
pub const MESSAGES_REASSEMBLED: &str = "gattwire_messages_reassembled_total";
/// Name of the counter tracking frames the transport failed to send.
pub const SEND_FAILURES: &str = "gattwire_send_failures_total";
/// Name of the counter tracking reassemblies abandoned after a timeout.
pub const REASSEMBLY_TIMEOUTS: &str = "gattwire_reassembly_timeouts_total";

/// Direction of frame processing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Frames received from the peer.
    Inbound,
    /// Frames written to the transport.
    Outbound,
}

impl Direction {
    /// Label value used for the `direction` label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Inbound => "inbound",
            Direction::Outbound => "outbound",
        }
    }
}

/// Record a processed frame for the given direction.
pub fn inc_frames(direction: Direction) {
    #[cfg(feature = "metrics")]
    counter!(FRAMES_PROCESSED, "direction" => direction.as_str()).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = direction;
}

/// Record an inbound frame that reassembly discarded.
pub fn inc_dropped(reason: &'static str) {
    #[cfg(feature = "metrics")]
    counter!(FRAMES_DROPPED, "reason" => reason).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = reason;
}

/// Record a completed message.
pub fn inc_messages() {
    #[cfg(feature = "metrics")]
    counter!(MESSAGES_REASSEMBLED).increment(1);
}

/// Record a frame the transport failed to send.
pub fn inc_send_failures() {
    #[cfg(feature = "metrics")]
    counter!(SEND_FAILURES).increment(1);
}

/// Record a reassembly abandoned after its deadline.
pub fn inc_timeouts() {
    #[cfg(feature = "metrics")]
    counter!(REASSEMBLY_TIMEOUTS).increment(1);
}
