//! In-process transport backed by a tokio channel.
//!
//! Useful for wiring two [`Link`](crate::Link)s together in tests and demos:
//! frames written to one [`MemoryTransport`] come out of the paired
//! [`InboundFrames`] in the same order.

use async_trait::async_trait;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::debug;

use super::{Transport, TransportError};
use crate::{channel::ChannelId, frame::Frame, link::Link};

/// Create a connected transport and inbound frame stream.
#[must_use]
pub fn memory_pair() -> (MemoryTransport, InboundFrames) {
    let (tx, rx) = mpsc::unbounded_channel();
    (MemoryTransport { tx }, InboundFrames { rx })
}

/// Sending half of an in-memory link.
#[derive(Clone, Debug)]
pub struct MemoryTransport {
    tx: mpsc::UnboundedSender<(ChannelId, Frame)>,
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn send_frame(&self, channel: &ChannelId, frame: Frame) -> Result<(), TransportError> {
        self.tx
            .send((channel.clone(), frame))
            .map_err(|_| TransportError::new(channel.clone(), "peer disconnected"))
    }
}

/// Receiving half of an in-memory link.
#[derive(Debug)]
pub struct InboundFrames {
    rx: mpsc::UnboundedReceiver<(ChannelId, Frame)>,
}

impl InboundFrames {
    /// Receive the next frame, or `None` once every sender is gone.
    pub async fn recv(&mut self) -> Option<(ChannelId, Frame)> { self.rx.recv().await }

    /// Feed every inbound frame into `link` on a background task.
    ///
    /// Frames for channels the link does not know are logged and skipped.
    /// The task ends when the transport is dropped or the link is closed.
    pub fn forward_to(mut self, link: Link) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                let next = tokio::select! {
                    biased;
                    () = link.closed() => break,
                    next = self.rx.recv() => next,
                };
                let Some((channel, frame)) = next else { break };
                if let Err(err) = link.deliver_frame(&channel, frame).await {
                    debug!(%channel, error = %err, "inbound frame not delivered");
                }
            }
            debug!("frame forwarder stopped");
        })
    }
}
