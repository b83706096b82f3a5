//! Per-message completion tracking for outbound frames.

use std::sync::{
    Arc,
    Mutex,
    PoisonError,
    atomic::{AtomicUsize, Ordering},
};

use tokio::sync::oneshot;

use super::SendError;
use crate::transport::TransportError;

#[derive(Debug, Default)]
struct Failures {
    failed: usize,
    first: Option<TransportError>,
}

/// Shared between the queued frame writes of one message.
///
/// The last write to finish resolves the receipt. If the writes are discarded
/// first, dropping the final clone drops the sender and the receipt resolves
/// to [`SendError::Cancelled`].
#[derive(Debug)]
pub(crate) struct ReceiptTracker {
    total: usize,
    remaining: AtomicUsize,
    failures: Mutex<Failures>,
    tx: Mutex<Option<oneshot::Sender<Result<(), SendError>>>>,
}

impl ReceiptTracker {
    pub(crate) fn new(total: usize) -> (Arc<Self>, SendReceipt) {
        let (tx, rx) = oneshot::channel();
        let tracker = Arc::new(Self {
            total,
            remaining: AtomicUsize::new(total),
            failures: Mutex::new(Failures::default()),
            tx: Mutex::new(Some(tx)),
        });
        (tracker, SendReceipt { frames: total, rx })
    }

    pub(crate) fn record(&self, result: Result<(), TransportError>) {
        if let Err(err) = result {
            let mut failures = self.failures.lock().unwrap_or_else(PoisonError::into_inner);
            failures.failed += 1;
            failures.first.get_or_insert(err);
        }
        if self.remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.resolve();
        }
    }

    fn resolve(&self) {
        let outcome = {
            let mut failures = self.failures.lock().unwrap_or_else(PoisonError::into_inner);
            match failures.first.take() {
                Some(first) => Err(SendError::Transport {
                    failed: failures.failed,
                    total: self.total,
                    first,
                }),
                None => Ok(()),
            }
        };
        let tx = self.tx.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(tx) = tx {
            let _ = tx.send(outcome);
        }
    }
}

/// Resolves once every frame of a sent message has been handed to the
/// transport.
#[derive(Debug)]
pub struct SendReceipt {
    frames: usize,
    rx: oneshot::Receiver<Result<(), SendError>>,
}

impl SendReceipt {
    /// Number of frames the message was split into, header included.
    #[must_use]
    pub fn frames(&self) -> usize { self.frames }

    /// Wait for the outcome of every frame write.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::Transport`] when any frame failed and
    /// [`SendError::Cancelled`] when the frames were discarded before being
    /// written.
    pub async fn wait(self) -> Result<(), SendError> {
        self.rx.await.unwrap_or(Err(SendError::Cancelled))
    }
}
