//! Ordered delivery of transport writes.
//!
//! The underlying frame-write primitive does not serialise concurrent calls,
//! so every write goes through an [`OrderedQueue`]. The queue is an actor: a
//! single tokio task owns the pending operations and runs them strictly one
//! at a time in enqueue order. Handles only send commands to that task, so
//! enqueueing never blocks and there is structurally one drain loop.

use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
};

use futures::{FutureExt, future::BoxFuture};
use static_assertions::const_assert;
use tokio::sync::{mpsc, oneshot};

mod actor;
mod builder;
mod errors;

use actor::QueueActor;
pub use builder::OrderedQueueBuilder;
pub use errors::{QueueConfigError, QueueError};

/// A deferred unit of work, usually one transport write.
///
/// The future is not polled until the drain loop reaches it.
pub type Operation = BoxFuture<'static, ()>;

/// Highest supported rate for [`OrderedQueueBuilder::rate`].
pub const MAX_FRAME_RATE: usize = 10_000;

// Pacing radio writes faster than this is never meaningful.
const_assert!(MAX_FRAME_RATE <= 1_000_000);

pub(crate) enum Command {
    Enqueue(Vec<Operation>),
    Start,
    Stop,
    Flush(oneshot::Sender<()>),
}

#[derive(Debug, Default)]
pub(crate) struct QueueStats {
    pub(crate) executed: AtomicU64,
    pub(crate) pending: AtomicUsize,
    pub(crate) running: AtomicBool,
}

/// Point-in-time view of a queue's counters.
///
/// Updated by the drain task, so values may trail the latest commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueueSnapshot {
    /// Operations run to completion (or panicked) since the queue was built.
    pub executed: u64,
    /// Operations waiting to run.
    pub pending: usize,
    /// Whether a drain loop is active.
    pub running: bool,
}

/// Cloneable handle to a FIFO drain task.
#[derive(Clone, Debug)]
pub struct OrderedQueue {
    tx: mpsc::UnboundedSender<Command>,
    stats: Arc<QueueStats>,
    token: tokio_util::sync::CancellationToken,
}

impl OrderedQueue {
    /// Start configuring a new queue.
    #[must_use]
    pub fn builder() -> OrderedQueueBuilder { OrderedQueueBuilder::default() }

    fn spawn(builder: OrderedQueueBuilder) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let stats = Arc::new(QueueStats::default());
        let token = builder.token.clone();
        tokio::spawn(QueueActor::new(builder, rx, Arc::clone(&stats)).run());
        Self { tx, stats, token }
    }

    fn command(&self, command: Command) -> Result<(), QueueError> {
        if self.token.is_cancelled() {
            return Err(QueueError::Closed);
        }
        self.tx.send(command).map_err(|_| QueueError::Closed)
    }

    /// Append one operation to the queue without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Closed`] if the drain task has shut down.
    pub fn enqueue<Fut>(&self, op: Fut) -> Result<(), QueueError>
    where
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.command(Command::Enqueue(vec![op.boxed()]))
    }

    /// Append several operations atomically.
    ///
    /// Operations from one batch are never interleaved with operations
    /// enqueued by other handles.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Closed`] if the drain task has shut down.
    pub fn enqueue_batch<I>(&self, ops: I) -> Result<(), QueueError>
    where
        I: IntoIterator<Item = Operation>,
    {
        let ops: Vec<Operation> = ops.into_iter().collect();
        if ops.is_empty() {
            return Ok(());
        }
        self.command(Command::Enqueue(ops))
    }

    /// Begin draining unless a drain loop is already active.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Closed`] if the drain task has shut down.
    pub fn start_if_needed(&self) -> Result<(), QueueError> { self.command(Command::Start) }

    /// Alias of [`OrderedQueue::start_if_needed`]; starting is idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Closed`] if the drain task has shut down.
    pub fn start(&self) -> Result<(), QueueError> { self.start_if_needed() }

    /// Discard every operation that has not started yet.
    ///
    /// An operation already running is allowed to finish.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Closed`] if the drain task has shut down.
    pub fn stop(&self) -> Result<(), QueueError> { self.command(Command::Stop) }

    /// Wait until every operation enqueued before this call has run.
    ///
    /// If the queue is not draining (auto-start disabled and never started),
    /// this waits until it is started and drained.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Closed`] if the drain task shuts down first.
    pub async fn flush(&self) -> Result<(), QueueError> {
        let (tx, rx) = oneshot::channel();
        self.command(Command::Flush(tx))?;
        rx.await.map_err(|_| QueueError::Closed)
    }

    /// Stop the drain task after the operation in flight, dropping the rest.
    pub fn shutdown(&self) { self.token.cancel(); }

    /// Whether the drain task has exited or been asked to.
    #[must_use]
    pub fn is_closed(&self) -> bool { self.tx.is_closed() || self.token.is_cancelled() }

    /// Current counters of the drain task.
    #[must_use]
    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            executed: self.stats.executed.load(Ordering::Acquire),
            pending: self.stats.pending.load(Ordering::Acquire),
            running: self.stats.running.load(Ordering::Acquire),
        }
    }
}
