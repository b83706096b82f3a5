//! Glue between applications, the transport and the framing protocol.
//!
//! A [`Link`] owns one [`OrderedQueue`] for every outbound write, one
//! [`Reassembler`] per registered channel and the sending half of the
//! [`Inbox`]. Completed messages and failures are published as
//! [`LinkEvent`]s after the reassembly lock is released, so handlers can call
//! back into the link freely.

use std::{
    fmt,
    sync::{Arc, Mutex, PoisonError},
};

use dashmap::DashMap;
use futures::FutureExt;
use tokio::{sync::mpsc, time::Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

mod config;
mod error;
mod inbox;
mod receipt;

pub use config::{ConfigError, DEFAULT_CHUNK_SIZE, LinkConfig, LinkConfigBuilder, MAX_CHUNK_SIZE};
pub use error::{LinkError, SendError};
pub use inbox::{InboundMessage, Inbox, LinkEvent, UNDECODABLE_SENTINEL};
use receipt::ReceiptTracker;
pub use receipt::SendReceipt;

use crate::{
    channel::ChannelId,
    frame::Frame,
    metrics::{self, Direction},
    queue::{Operation, OrderedQueue, QueueSnapshot},
    reassembly::Reassembler,
    segment::Segmenter,
    transport::Transport,
};

struct LinkInner {
    transport: Arc<dyn Transport>,
    config: LinkConfig,
    segmenter: Segmenter,
    queue: OrderedQueue,
    reassemblers: DashMap<ChannelId, Mutex<Reassembler>>,
    events: mpsc::Sender<LinkEvent>,
    token: CancellationToken,
}

/// Cloneable handle to one end of a framed link.
///
/// # Examples
///
/// ```rust,no_run
/// use gattwire::{ChannelId, Link, LinkConfig, transport::memory_pair};
///
/// # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
/// let (to_b, frames_for_b) = memory_pair();
/// let (to_a, frames_for_a) = memory_pair();
/// let (a, _a_inbox) = Link::new(to_b, LinkConfig::default())?;
/// let (b, mut b_inbox) = Link::new(to_a, LinkConfig::default())?;
/// frames_for_b.forward_to(b.clone());
/// frames_for_a.forward_to(a.clone());
///
/// a.send(&ChannelId::DATA, "hello world")?.wait().await?;
/// let message = b_inbox.recv_message().await.expect("link open");
/// assert_eq!(message.text, "hello world");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Link {
    inner: Arc<LinkInner>,
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Link")
            .field("config", &self.inner.config)
            .field("channels", &self.inner.reassemblers.len())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl Link {
    /// Create a link writing through `transport`.
    ///
    /// Must be called from within a tokio runtime; the send queue runs on a
    /// spawned task.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::Config`] if the queue rejects the pacing settings.
    pub fn new<T>(transport: T, config: LinkConfig) -> Result<(Self, Inbox), LinkError>
    where
        T: Transport,
    {
        Self::with_transport(Arc::new(transport), config)
    }

    /// Create a link from a shared transport.
    ///
    /// # Errors
    ///
    /// See [`Link::new`].
    pub fn with_transport(
        transport: Arc<dyn Transport>,
        config: LinkConfig,
    ) -> Result<(Self, Inbox), LinkError> {
        let token = CancellationToken::new();
        let queue = OrderedQueue::builder()
            .auto_start(config.auto_start())
            .inter_frame_delay(config.inter_frame_delay())
            .rate(config.frame_rate())
            .cancellation(token.child_token())
            .build()?;
        let (events, rx) = mpsc::channel(config.inbox_capacity().get());
        let inbox = Inbox::new(rx, token.clone());
        let segmenter = Segmenter::new(config.chunk_size()).with_padding(config.pad_frames());

        let reassemblers = DashMap::new();
        for channel in config.channels() {
            reassemblers.insert(channel.clone(), Mutex::new(new_reassembler(&config)));
        }

        info!(
            chunk_size = config.chunk_size().get(),
            channels = config.channels().len(),
            "link created"
        );
        let inner = LinkInner {
            transport,
            config,
            segmenter,
            queue,
            reassemblers,
            events,
            token,
        };
        Ok((
            Self {
                inner: Arc::new(inner),
            },
            inbox,
        ))
    }

    /// Configuration the link was created with.
    #[must_use]
    pub fn config(&self) -> &LinkConfig { &self.inner.config }

    /// Add a channel with fresh reassembly state.
    ///
    /// Returns `false` if the channel was already registered; its state is
    /// left untouched.
    pub fn register_channel(&self, channel: ChannelId) -> bool {
        let mut added = false;
        self.inner.reassemblers.entry(channel.clone()).or_insert_with(|| {
            added = true;
            Mutex::new(new_reassembler(&self.inner.config))
        });
        if added {
            debug!(%channel, "channel registered");
        }
        added
    }

    /// Remove a channel, discarding any partial message.
    ///
    /// Returns `false` if the channel was not registered.
    pub fn unregister_channel(&self, channel: &ChannelId) -> bool {
        let removed = self.inner.reassemblers.remove(channel).is_some();
        if removed {
            debug!(%channel, "channel unregistered");
        }
        removed
    }

    /// Currently registered channels, sorted.
    #[must_use]
    pub fn channels(&self) -> Vec<ChannelId> {
        let mut channels: Vec<ChannelId> = self
            .inner
            .reassemblers
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        channels.sort();
        channels
    }

    /// Segment `message` and queue its frames for `channel`.
    ///
    /// All frames of one message are queued as a single batch, so messages
    /// sent concurrently are never interleaved on the transport. The call
    /// returns immediately; await the [`SendReceipt`] to learn whether every
    /// frame was written.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::UnknownChannel`] for an unregistered channel,
    /// [`LinkError::Segment`] when the message cannot be framed and
    /// [`LinkError::Closed`] after [`Link::close`].
    pub fn send(&self, channel: &ChannelId, message: &str) -> Result<SendReceipt, LinkError> {
        if self.is_closed() {
            return Err(LinkError::Closed);
        }
        if !self.inner.reassemblers.contains_key(channel) {
            return Err(LinkError::UnknownChannel(channel.clone()));
        }

        let batch = self.inner.segmenter.segment(message)?;
        let framed = batch.is_framed();
        let (tracker, receipt) = ReceiptTracker::new(batch.len());
        let ops: Vec<Operation> = batch
            .into_iter()
            .map(|frame| self.write_op(channel.clone(), frame, Arc::clone(&tracker)))
            .collect();
        self.inner.queue.enqueue_batch(ops)?;
        debug!(
            %channel,
            bytes = message.len(),
            frames = receipt.frames(),
            framed,
            "message queued"
        );
        Ok(receipt)
    }

    fn write_op(&self, channel: ChannelId, frame: Frame, tracker: Arc<ReceiptTracker>) -> Operation {
        let transport = Arc::clone(&self.inner.transport);
        let events = self.inner.events.clone();
        async move {
            let result = transport.send_frame(&channel, frame).await;
            match &result {
                Ok(()) => metrics::inc_frames(Direction::Outbound),
                Err(err) => {
                    warn!(%channel, error = %err, "frame write failed");
                    metrics::inc_send_failures();
                    let event = LinkEvent::SendFailed {
                        channel: channel.clone(),
                        error: err.clone(),
                    };
                    if events.try_send(event).is_err() {
                        debug!(%channel, "inbox unavailable; send failure not reported");
                    }
                }
            }
            tracker.record(result);
        }
        .boxed()
    }

    /// Feed one inbound frame to the reassembler of `channel`.
    ///
    /// A stale partial message is purged first when a reassembly timeout is
    /// configured. Resulting events are published once the reassembler is
    /// released; this waits while the inbox is full.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::UnknownChannel`] for an unregistered channel and
    /// [`LinkError::Closed`] after [`Link::close`].
    pub async fn deliver_frame(&self, channel: &ChannelId, frame: Frame) -> Result<(), LinkError> {
        if self.is_closed() {
            return Err(LinkError::Closed);
        }
        metrics::inc_frames(Direction::Inbound);

        let events = {
            let entry = self
                .inner
                .reassemblers
                .get(channel)
                .ok_or_else(|| LinkError::UnknownChannel(channel.clone()))?;
            let mut reassembler = entry.lock().unwrap_or_else(PoisonError::into_inner);
            let now = Instant::now().into_std();
            let mut events = Vec::new();
            if let Some(err) = reassembler.purge_expired_at(now) {
                warn!(%channel, error = %err, "partial message abandoned");
                events.push(LinkEvent::from_reassembly(channel.clone(), err));
            }
            match reassembler.push_at(frame, now) {
                Ok(Some(text)) => events.push(LinkEvent::message(channel.clone(), text)),
                Ok(None) => {}
                Err(err) => {
                    warn!(%channel, error = %err, "reassembly failed");
                    events.push(LinkEvent::from_reassembly(channel.clone(), err));
                }
            }
            events
        };

        self.publish(events).await;
        Ok(())
    }

    /// Abandon partial messages older than the reassembly timeout on every
    /// channel.
    ///
    /// Returns the number of messages abandoned. Does nothing without a
    /// configured timeout.
    pub async fn sweep_expired(&self) -> usize {
        if self.inner.config.reassembly_timeout().is_none() {
            return 0;
        }
        let now = Instant::now().into_std();
        let events: Vec<LinkEvent> = self
            .inner
            .reassemblers
            .iter()
            .filter_map(|entry| {
                let err = entry
                    .value()
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .purge_expired_at(now)?;
                warn!(channel = %entry.key(), error = %err, "partial message abandoned");
                Some(LinkEvent::from_reassembly(entry.key().clone(), err))
            })
            .collect();
        let purged = events.len();
        self.publish(events).await;
        purged
    }

    async fn publish(&self, events: Vec<LinkEvent>) {
        for event in events {
            if self.inner.events.send(event).await.is_err() {
                debug!("inbox dropped; discarding link event");
                return;
            }
        }
    }

    /// Discard queued frames that have not been written yet.
    ///
    /// The write in flight completes. Receipts of discarded messages resolve
    /// to [`SendError::Cancelled`].
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::Closed`] if the link is closed.
    pub fn stop_sending(&self) -> Result<(), LinkError> {
        self.inner.queue.stop()?;
        Ok(())
    }

    /// Begin writing queued frames, for links built with auto-start off.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::Closed`] if the link is closed.
    pub fn start_sending(&self) -> Result<(), LinkError> {
        self.inner.queue.start_if_needed()?;
        Ok(())
    }

    /// Wait until every frame queued before this call has been written.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::Closed`] if the link closes first.
    pub async fn flush(&self) -> Result<(), LinkError> {
        self.inner.queue.flush().await?;
        Ok(())
    }

    /// Counters of the outbound queue.
    #[must_use]
    pub fn queue_snapshot(&self) -> QueueSnapshot { self.inner.queue.snapshot() }

    /// Shut the link down.
    ///
    /// Stops the send queue after the write in flight and drops all
    /// reassembly state. Later calls fail with [`LinkError::Closed`].
    pub fn close(&self) {
        if self.inner.token.is_cancelled() {
            return;
        }
        self.inner.token.cancel();
        self.inner.reassemblers.clear();
        info!("link closed");
    }

    /// Whether [`Link::close`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool { self.inner.token.is_cancelled() }

    /// Resolve once [`Link::close`] has been called.
    pub async fn closed(&self) { self.inner.token.cancelled().await; }
}

fn new_reassembler(config: &LinkConfig) -> Reassembler {
    Reassembler::new()
        .with_idle_policy(config.idle_policy())
        .with_header_collision(config.header_collision())
        .with_timeout(config.reassembly_timeout())
        .with_max_message_size(config.max_message_size())
}
