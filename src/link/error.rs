//! Errors surfaced by [`Link`](super::Link) operations.

use thiserror::Error;

use super::ConfigError;
use crate::{
    channel::ChannelId,
    queue::{QueueConfigError, QueueError},
    segment::SegmentError,
    transport::TransportError,
};

/// Errors returned synchronously by a [`Link`](super::Link).
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LinkError {
    /// The channel was never registered, or was unregistered.
    #[error("unknown channel {0}")]
    UnknownChannel(ChannelId),
    /// The message cannot be split into frames.
    #[error(transparent)]
    Segment(#[from] SegmentError),
    /// The link was closed.
    #[error("link closed")]
    Closed,
    /// The link configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<QueueError> for LinkError {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::Closed => Self::Closed,
        }
    }
}

impl From<QueueConfigError> for LinkError {
    fn from(err: QueueConfigError) -> Self {
        match err {
            QueueConfigError::InvalidRate(rate) => Self::Config(ConfigError::InvalidRate(rate)),
        }
    }
}

/// Outcome of a message whose frames did not all reach the transport.
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SendError {
    /// One or more frame writes failed.
    #[error("{failed} of {total} frames failed; first error: {first}")]
    Transport {
        failed: usize,
        total: usize,
        first: TransportError,
    },
    /// The frames were discarded before being written.
    #[error("send cancelled before all frames were written")]
    Cancelled,
}
