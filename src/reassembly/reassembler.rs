//! Inbound helper that stitches frames back into complete messages.
//!
//! A [`Reassembler`] owns the reassembly state of exactly one channel. It
//! waits for a [`SizeHeader`] frame, collects the announced number of data
//! frames in arrival order, strips NUL padding and decodes the joined payload
//! as UTF-8. Frames that do not fit the protocol are dropped rather than
//! surfaced, since a lossy link makes stray frames expected.

use std::{
    num::NonZeroUsize,
    time::{Duration, Instant},
};

use tracing::{debug, warn};

use super::ReassemblyError;
use crate::{
    frame::{Frame, PADDING},
    metrics,
    segment::SizeHeader,
};

/// Handling of non-header frames that arrive while no message is collecting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IdleFramePolicy {
    /// Treat the frame as a complete single-frame message.
    #[default]
    Deliver,
    /// Discard the frame.
    Drop,
}

/// Handling of a header that arrives while a message is still collecting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HeaderCollision {
    /// Abandon the partial message and start collecting the new one.
    #[default]
    Restart,
    /// Discard the new header and keep collecting the current message.
    Ignore,
}

#[derive(Debug)]
struct PartialMessage {
    expected: usize,
    frames: Vec<Frame>,
    bytes: usize,
    started_at: Instant,
}

impl PartialMessage {
    fn new(expected: usize, started_at: Instant) -> Self {
        Self {
            expected,
            frames: Vec::new(),
            bytes: 0,
            started_at,
        }
    }

    fn is_complete(&self) -> bool { self.frames.len() >= self.expected }

    fn into_text(self) -> Result<String, ReassemblyError> {
        let frames = self.frames.len();
        let mut payload = Vec::with_capacity(self.bytes);
        for frame in self.frames {
            payload.extend(frame.as_bytes().iter().filter(|byte| **byte != PADDING));
        }
        String::from_utf8(payload).map_err(|_| ReassemblyError::Undecodable { frames })
    }
}

/// Per-channel reassembly state machine.
#[derive(Debug, Default)]
pub struct Reassembler {
    idle_policy: IdleFramePolicy,
    header_collision: HeaderCollision,
    timeout: Option<Duration>,
    max_message_size: Option<NonZeroUsize>,
    partial: Option<PartialMessage>,
}

impl Reassembler {
    /// Create an idle reassembler with default policies and no limits.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Choose how bare frames are treated while idle.
    #[must_use]
    pub fn with_idle_policy(mut self, policy: IdleFramePolicy) -> Self {
        self.idle_policy = policy;
        self
    }

    /// Choose how a second header is treated while collecting.
    #[must_use]
    pub fn with_header_collision(mut self, policy: HeaderCollision) -> Self {
        self.header_collision = policy;
        self
    }

    /// Abandon partial messages older than `timeout` when purged.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Cap the size of a reassembled message in bytes, padding included.
    #[must_use]
    pub fn with_max_message_size(mut self, limit: Option<NonZeroUsize>) -> Self {
        self.max_message_size = limit;
        self
    }

    /// Process a frame using the current time.
    ///
    /// Returns `Ok(Some(_))` when the frame completes a message and `Ok(None)`
    /// while more frames are needed or the frame was dropped.
    ///
    /// # Errors
    ///
    /// Returns [`ReassemblyError::Undecodable`] when a completed payload is not
    /// UTF-8 and [`ReassemblyError::MessageTooLarge`] when the size cap is
    /// exceeded. The partial message is discarded in both cases.
    pub fn push(&mut self, frame: Frame) -> Result<Option<String>, ReassemblyError> {
        self.push_at(frame, Instant::now())
    }

    /// Process a frame using an explicit clock reading.
    ///
    /// `now` only stamps the start of a new reassembly; expiry is checked by
    /// [`Reassembler::purge_expired_at`].
    ///
    /// # Errors
    ///
    /// See [`Reassembler::push`].
    pub fn push_at(
        &mut self,
        frame: Frame,
        now: Instant,
    ) -> Result<Option<String>, ReassemblyError> {
        if let Some(header) = SizeHeader::parse(&frame) {
            return Ok(self.accept_header(header, now));
        }

        let Some(partial) = self.partial.as_mut() else {
            return Ok(self.accept_idle(&frame));
        };

        if frame.text().is_none() {
            debug!(len = frame.len(), "dropping undecodable frame");
            metrics::inc_dropped("undecodable");
            return Ok(None);
        }

        let attempted = partial.bytes.saturating_add(frame.len());
        if let Some(limit) = self.max_message_size
            && attempted > limit.get()
        {
            self.partial = None;
            return Err(ReassemblyError::MessageTooLarge { attempted, limit });
        }

        partial.bytes = attempted;
        partial.frames.push(frame);
        if !partial.is_complete() {
            return Ok(None);
        }

        match self.partial.take().map(PartialMessage::into_text) {
            Some(Ok(text)) => {
                metrics::inc_messages();
                Ok(Some(text))
            }
            Some(Err(err)) => Err(err),
            None => Ok(None),
        }
    }

    /// Abandon the partial message if it is older than the configured timeout.
    ///
    /// Returns [`ReassemblyError::Timeout`] describing the discarded message.
    pub fn purge_expired(&mut self) -> Option<ReassemblyError> {
        self.purge_expired_at(Instant::now())
    }

    /// Abandon a stale partial message using an explicit clock reading.
    pub fn purge_expired_at(&mut self, now: Instant) -> Option<ReassemblyError> {
        let timeout = self.timeout?;
        let elapsed = now.saturating_duration_since(self.partial.as_ref()?.started_at);
        if elapsed < timeout {
            return None;
        }
        let partial = self.partial.take()?;
        metrics::inc_timeouts();
        Some(ReassemblyError::Timeout {
            expected: partial.expected,
            received: partial.frames.len(),
            elapsed,
        })
    }

    /// Whether a message is currently being collected.
    #[must_use]
    pub fn is_collecting(&self) -> bool { self.partial.is_some() }

    /// Number of data frames announced by the active header, zero when idle.
    #[must_use]
    pub fn expected(&self) -> usize { self.partial.as_ref().map_or(0, |p| p.expected) }

    /// Number of data frames collected so far, zero when idle.
    #[must_use]
    pub fn received(&self) -> usize { self.partial.as_ref().map_or(0, |p| p.frames.len()) }

    /// Discard any partial message and return to idle.
    pub fn reset(&mut self) { self.partial = None; }

    fn accept_header(&mut self, header: SizeHeader, now: Instant) -> Option<String> {
        // Every data frame carries at least one byte.
        if let Some(limit) = self.max_message_size
            && header.count() > limit.get()
        {
            debug!(count = header.count(), limit = limit.get(), "dropping oversized header");
            metrics::inc_dropped("oversized_header");
            return None;
        }
        if let Some(partial) = &self.partial {
            match self.header_collision {
                HeaderCollision::Restart => {
                    warn!(
                        expected = partial.expected,
                        received = partial.frames.len(),
                        "header arrived mid-message; discarding partial message"
                    );
                    metrics::inc_dropped("restarted");
                }
                HeaderCollision::Ignore => {
                    debug!(count = header.count(), "ignoring header while collecting");
                    metrics::inc_dropped("header_collision");
                    return None;
                }
            }
        }

        if header.is_empty_message() {
            self.partial = None;
            metrics::inc_messages();
            return Some(String::new());
        }
        self.partial = Some(PartialMessage::new(header.count(), now));
        None
    }

    fn accept_idle(&self, frame: &Frame) -> Option<String> {
        if self.idle_policy == IdleFramePolicy::Drop {
            debug!(len = frame.len(), "dropping frame received without a header");
            metrics::inc_dropped("no_header");
            return None;
        }

        let bytes: Vec<u8> = frame
            .as_bytes()
            .iter()
            .copied()
            .filter(|byte| *byte != PADDING)
            .collect();
        if let Ok(text) = String::from_utf8(bytes) {
            metrics::inc_messages();
            Some(text)
        } else {
            debug!(len = frame.len(), "dropping undecodable bare frame");
            metrics::inc_dropped("undecodable");
            None
        }
    }
}
