//! Inbound events produced by a [`Link`](super::Link).

use std::{num::NonZeroUsize, time::Duration};

use tokio::{sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{channel::ChannelId, reassembly::ReassemblyError, transport::TransportError};

/// Text handed to [`Inbox::dispatch`] handlers when a payload cannot be decoded.
pub const UNDECODABLE_SENTINEL: &str = "-";

/// A completed inbound message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InboundMessage {
    /// Channel the frames arrived on.
    pub channel: ChannelId,
    /// Reassembled text.
    pub text: String,
}

/// Everything a link reports to the application.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LinkEvent {
    /// A message was reassembled.
    Message(InboundMessage),
    /// All announced frames arrived but the payload was not UTF-8.
    Undecodable { channel: ChannelId, frames: usize },
    /// A partial message was abandoned after the reassembly timeout.
    ReassemblyTimeout {
        channel: ChannelId,
        expected: usize,
        received: usize,
        elapsed: Duration,
    },
    /// A partial message exceeded the configured size cap.
    MessageTooLarge {
        channel: ChannelId,
        attempted: usize,
        limit: NonZeroUsize,
    },
    /// The transport rejected an outbound frame.
    SendFailed {
        channel: ChannelId,
        error: TransportError,
    },
}

impl LinkEvent {
    pub(crate) fn message(channel: ChannelId, text: String) -> Self {
        Self::Message(InboundMessage { channel, text })
    }

    pub(crate) fn from_reassembly(channel: ChannelId, err: ReassemblyError) -> Self {
        match err {
            ReassemblyError::Undecodable { frames } => Self::Undecodable { channel, frames },
            ReassemblyError::Timeout {
                expected,
                received,
                elapsed,
            } => Self::ReassemblyTimeout {
                channel,
                expected,
                received,
                elapsed,
            },
            ReassemblyError::MessageTooLarge { attempted, limit } => Self::MessageTooLarge {
                channel,
                attempted,
                limit,
            },
        }
    }

    /// Channel the event relates to.
    #[must_use]
    pub fn channel(&self) -> &ChannelId {
        match self {
            Self::Message(message) => &message.channel,
            Self::Undecodable { channel, .. }
            | Self::ReassemblyTimeout { channel, .. }
            | Self::MessageTooLarge { channel, .. }
            | Self::SendFailed { channel, .. } => channel,
        }
    }
}

/// Receiving end of a link's bounded event channel.
#[derive(Debug)]
pub struct Inbox {
    rx: mpsc::Receiver<LinkEvent>,
    closed: CancellationToken,
}

impl Inbox {
    pub(crate) fn new(rx: mpsc::Receiver<LinkEvent>, closed: CancellationToken) -> Self {
        Self { rx, closed }
    }

    /// Receive the next event, or `None` once the link is closed or gone.
    ///
    /// Events published before [`Link::close`](super::Link::close) are still
    /// returned; after that the inbox yields `None`.
    pub async fn recv(&mut self) -> Option<LinkEvent> {
        if !self.closed.is_cancelled() {
            tokio::select! {
                biased;
                event = self.rx.recv() => return event,
                () = self.closed.cancelled() => {}
            }
        }
        self.rx.try_recv().ok()
    }

    /// Receive the next completed message, skipping other events.
    pub async fn recv_message(&mut self) -> Option<InboundMessage> {
        loop {
            match self.recv().await? {
                LinkEvent::Message(message) => return Some(message),
                other => debug!(event = ?other, "skipping non-message event"),
            }
        }
    }

    /// Receive an event if one is ready without waiting.
    pub fn try_recv(&mut self) -> Option<LinkEvent> { self.rx.try_recv().ok() }

    /// Call `handler` for every message on a background task.
    ///
    /// Undecodable payloads are reported as [`UNDECODABLE_SENTINEL`]. Other
    /// events are logged. The task ends when the link is closed or gone.
    pub fn dispatch<F>(mut self, mut handler: F) -> JoinHandle<()>
    where
        F: FnMut(String, ChannelId) + Send + 'static,
    {
        tokio::spawn(async move {
            while let Some(event) = self.recv().await {
                match event {
                    LinkEvent::Message(InboundMessage { channel, text }) => handler(text, channel),
                    LinkEvent::Undecodable { channel, .. } => {
                        handler(UNDECODABLE_SENTINEL.to_owned(), channel);
                    }
                    other => warn!(event = ?other, "link event not handled by dispatcher"),
                }
            }
        })
    }
}
