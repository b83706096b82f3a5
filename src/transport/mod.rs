//! Seam to the platform radio service.
//!
//! The transport writes one frame to one channel. It does not serialise
//! concurrent writes; the [`OrderedQueue`](crate::queue::OrderedQueue) inside
//! a [`Link`](crate::Link) guarantees that only one write is in flight.
//! Inbound frames travel the other way: the transport hands them to
//! [`Link::deliver_frame`](crate::Link::deliver_frame).

use async_trait::async_trait;
use thiserror::Error;

use crate::{channel::ChannelId, frame::Frame};

pub mod memory;

pub use memory::{MemoryTransport, memory_pair};

/// Failure reported by the transport for a single frame write.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("transport failed to write to {channel}: {reason}")]
pub struct TransportError {
    channel: ChannelId,
    reason: String,
}

impl TransportError {
    /// Create an error for a write to `channel`.
    #[must_use]
    pub fn new(channel: ChannelId, reason: impl Into<String>) -> Self {
        Self {
            channel,
            reason: reason.into(),
        }
    }

    /// Channel the failed write targeted.
    #[must_use]
    pub fn channel(&self) -> &ChannelId { &self.channel }

    /// Human readable cause supplied by the transport.
    #[must_use]
    pub fn reason(&self) -> &str { &self.reason }
}

/// Frame-level write primitive offered by the radio service.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Write `frame` to `channel`.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if the frame could not be written.
    async fn send_frame(&self, channel: &ChannelId, frame: Frame) -> Result<(), TransportError>;
}
