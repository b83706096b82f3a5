//! Error types for queue operations and configuration.

use thiserror::Error;

use super::MAX_FRAME_RATE;

/// Errors returned by [`OrderedQueue`](super::OrderedQueue) handles.
#[non_exhaustive]
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// The drain task has shut down and accepts no more operations.
    #[error("ordered queue closed")]
    Closed,
}

/// Errors returned when building an [`OrderedQueue`](super::OrderedQueue).
#[non_exhaustive]
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum QueueConfigError {
    /// The provided rate was zero or exceeded [`MAX_FRAME_RATE`].
    #[error("invalid rate {0}; must be between 1 and {max}", max = MAX_FRAME_RATE)]
    InvalidRate(usize),
}
