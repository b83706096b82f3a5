//! Configuration for a [`Link`](super::Link).

use std::{num::NonZeroUsize, time::Duration};

use thiserror::Error;

use crate::{
    channel::ChannelId,
    queue::MAX_FRAME_RATE,
    reassembly::{HeaderCollision, IdleFramePolicy},
};

/// Chunk size used by the deployed peers.
pub const DEFAULT_CHUNK_SIZE: NonZeroUsize = NonZeroUsize::new(128).unwrap();
/// Largest chunk a characteristic write accepts.
pub const MAX_CHUNK_SIZE: usize = 512;
const DEFAULT_INBOX_CAPACITY: NonZeroUsize = NonZeroUsize::new(64).unwrap();

/// Errors returned when validating a [`LinkConfig`].
#[non_exhaustive]
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Chunk size must be between 1 and [`MAX_CHUNK_SIZE`].
    #[error("invalid chunk size {0}; must be between 1 and {max}", max = MAX_CHUNK_SIZE)]
    InvalidChunkSize(usize),
    /// The inbox must hold at least one event.
    #[error("inbox capacity must be at least 1")]
    InvalidInboxCapacity,
    /// The frame rate was zero or exceeded [`MAX_FRAME_RATE`].
    #[error("invalid frame rate {0}; must be between 1 and {max}", max = MAX_FRAME_RATE)]
    InvalidRate(usize),
}

/// Settings shared by the segmenter, reassemblers and queue of one link.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkConfig {
    chunk_size: NonZeroUsize,
    pad_frames: bool,
    idle_policy: IdleFramePolicy,
    header_collision: HeaderCollision,
    reassembly_timeout: Option<Duration>,
    max_message_size: Option<NonZeroUsize>,
    inter_frame_delay: Duration,
    frame_rate: Option<usize>,
    auto_start: bool,
    inbox_capacity: NonZeroUsize,
    channels: Vec<ChannelId>,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            pad_frames: false,
            idle_policy: IdleFramePolicy::Deliver,
            header_collision: HeaderCollision::Restart,
            reassembly_timeout: None,
            max_message_size: None,
            inter_frame_delay: Duration::ZERO,
            frame_rate: None,
            auto_start: true,
            inbox_capacity: DEFAULT_INBOX_CAPACITY,
            channels: vec![ChannelId::DATA],
        }
    }
}

impl LinkConfig {
    /// Start building a configuration from the defaults.
    #[must_use]
    pub fn builder() -> LinkConfigBuilder { LinkConfigBuilder::default() }

    /// Maximum payload bytes per data frame.
    #[must_use]
    pub fn chunk_size(&self) -> NonZeroUsize { self.chunk_size }

    /// Whether frames are NUL-padded to the chunk size.
    #[must_use]
    pub fn pad_frames(&self) -> bool { self.pad_frames }

    /// Handling of bare frames while idle.
    #[must_use]
    pub fn idle_policy(&self) -> IdleFramePolicy { self.idle_policy }

    /// Handling of a header that interrupts a message.
    #[must_use]
    pub fn header_collision(&self) -> HeaderCollision { self.header_collision }

    /// Deadline for completing a started message, if any.
    #[must_use]
    pub fn reassembly_timeout(&self) -> Option<Duration> { self.reassembly_timeout }

    /// Cap on reassembled message size, if any.
    #[must_use]
    pub fn max_message_size(&self) -> Option<NonZeroUsize> { self.max_message_size }

    /// Pause between consecutive frame writes.
    #[must_use]
    pub fn inter_frame_delay(&self) -> Duration { self.inter_frame_delay }

    /// Frame writes per second, if limited.
    #[must_use]
    pub fn frame_rate(&self) -> Option<usize> { self.frame_rate }

    /// Whether sends start draining immediately.
    #[must_use]
    pub fn auto_start(&self) -> bool { self.auto_start }

    /// Capacity of the inbound event channel.
    #[must_use]
    pub fn inbox_capacity(&self) -> NonZeroUsize { self.inbox_capacity }

    /// Channels registered when the link is created.
    #[must_use]
    pub fn channels(&self) -> &[ChannelId] { &self.channels }
}

/// Builder for [`LinkConfig`].
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use gattwire::{ChannelId, LinkConfig};
///
/// let config = LinkConfig::builder()
///     .chunk_size(20)
///     .pad_frames(true)
///     .reassembly_timeout(Some(Duration::from_secs(10)))
///     .channel(ChannelId::from_static("0xFFE1"))
///     .build()
///     .expect("valid configuration");
/// assert_eq!(config.chunk_size().get(), 20);
/// assert_eq!(config.channels().len(), 2);
/// ```
#[derive(Clone, Debug)]
pub struct LinkConfigBuilder {
    chunk_size: usize,
    inbox_capacity: usize,
    config: LinkConfig,
}

impl Default for LinkConfigBuilder {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE.get(),
            inbox_capacity: DEFAULT_INBOX_CAPACITY.get(),
            config: LinkConfig::default(),
        }
    }
}

impl LinkConfigBuilder {
    /// Set the maximum payload bytes per data frame.
    #[must_use]
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Pad short frames with NUL bytes for fixed-width transports.
    #[must_use]
    pub fn pad_frames(mut self, pad_frames: bool) -> Self {
        self.config.pad_frames = pad_frames;
        self
    }

    /// Choose how bare frames are treated while no message is collecting.
    #[must_use]
    pub fn idle_policy(mut self, policy: IdleFramePolicy) -> Self {
        self.config.idle_policy = policy;
        self
    }

    /// Choose how a header arriving mid-message is treated.
    #[must_use]
    pub fn header_collision(mut self, policy: HeaderCollision) -> Self {
        self.config.header_collision = policy;
        self
    }

    /// Abandon messages that do not complete within `timeout`.
    #[must_use]
    pub fn reassembly_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.reassembly_timeout = timeout;
        self
    }

    /// Cap reassembled message size in bytes.
    #[must_use]
    pub fn max_message_size(mut self, limit: Option<NonZeroUsize>) -> Self {
        self.config.max_message_size = limit;
        self
    }

    /// Pause between consecutive frame writes.
    #[must_use]
    pub fn inter_frame_delay(mut self, delay: Duration) -> Self {
        self.config.inter_frame_delay = delay;
        self
    }

    /// Limit frame writes per second. `None` disables the limit.
    #[must_use]
    pub fn frame_rate(mut self, rate: Option<usize>) -> Self {
        self.config.frame_rate = rate;
        self
    }

    /// Start draining as soon as a message is sent.
    #[must_use]
    pub fn auto_start(mut self, auto_start: bool) -> Self {
        self.config.auto_start = auto_start;
        self
    }

    /// Capacity of the inbound event channel.
    #[must_use]
    pub fn inbox_capacity(mut self, capacity: usize) -> Self {
        self.inbox_capacity = capacity;
        self
    }

    /// Register an additional channel at link creation.
    #[must_use]
    pub fn channel(mut self, channel: ChannelId) -> Self {
        if !self.config.channels.contains(&channel) {
            self.config.channels.push(channel);
        }
        self
    }

    /// Replace the set of channels registered at link creation.
    #[must_use]
    pub fn channels(mut self, channels: impl IntoIterator<Item = ChannelId>) -> Self {
        self.config.channels.clear();
        for channel in channels {
            self = self.channel(channel);
        }
        self
    }

    /// Validate and return the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the chunk size, inbox capacity or frame
    /// rate is out of range.
    pub fn build(self) -> Result<LinkConfig, ConfigError> {
        let Self {
            chunk_size,
            inbox_capacity,
            mut config,
        } = self;
        config.chunk_size = NonZeroUsize::new(chunk_size)
            .filter(|size| size.get() <= MAX_CHUNK_SIZE)
            .ok_or(ConfigError::InvalidChunkSize(chunk_size))?;
        config.inbox_capacity =
            NonZeroUsize::new(inbox_capacity).ok_or(ConfigError::InvalidInboxCapacity)?;
        if let Some(rate) = config.frame_rate
            && (rate == 0 || rate > MAX_FRAME_RATE)
        {
            return Err(ConfigError::InvalidRate(rate));
        }
        Ok(config)
    }
}
