//! Builder for configuring an ordered queue.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::{MAX_FRAME_RATE, OrderedQueue, QueueConfigError};

/// Builder for [`OrderedQueue`].
///
/// By default the queue starts draining as soon as an operation is enqueued,
/// runs operations back to back and is cancelled only through
/// [`OrderedQueue::shutdown`].
///
/// # Examples
///
/// ```rust,no_run
/// use std::time::Duration;
///
/// use gattwire::queue::OrderedQueue;
///
/// # async fn demo() {
/// let queue = OrderedQueue::builder()
///     .inter_frame_delay(Duration::from_millis(20))
///     .rate(Some(50))
///     .build()
///     .expect("failed to build OrderedQueue");
/// queue.enqueue(async { println!("first") }).expect("queue open");
/// queue.flush().await.expect("queue open");
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct OrderedQueueBuilder {
    pub(super) auto_start: bool,
    pub(super) inter_frame_delay: Duration,
    pub(super) rate: Option<usize>,
    pub(super) token: CancellationToken,
}

impl Default for OrderedQueueBuilder {
    fn default() -> Self {
        Self {
            auto_start: true,
            inter_frame_delay: Duration::ZERO,
            rate: None,
            token: CancellationToken::new(),
        }
    }
}

impl OrderedQueueBuilder {
    /// Start draining automatically whenever operations are enqueued.
    ///
    /// When disabled, nothing runs until [`OrderedQueue::start_if_needed`].
    #[must_use]
    pub fn auto_start(mut self, auto_start: bool) -> Self {
        self.auto_start = auto_start;
        self
    }

    /// Minimum pause between the end of one operation and the start of the next.
    #[must_use]
    pub fn inter_frame_delay(mut self, delay: Duration) -> Self {
        self.inter_frame_delay = delay;
        self
    }

    /// Cap the drain rate in operations per second.
    ///
    /// Passing `None` disables rate limiting.
    #[must_use]
    pub fn rate(mut self, rate: Option<usize>) -> Self {
        self.rate = rate;
        self
    }

    /// Shut the drain task down when `token` is cancelled.
    #[must_use]
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    /// Spawn the drain task and return a handle to it.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`QueueConfigError::InvalidRate`] if the rate is zero or
    /// greater than [`MAX_FRAME_RATE`].
    pub fn build(self) -> Result<OrderedQueue, QueueConfigError> {
        if let Some(rate) = self.rate
            && (rate == 0 || rate > MAX_FRAME_RATE)
        {
            return Err(QueueConfigError::InvalidRate(rate));
        }
        Ok(OrderedQueue::spawn(self))
    }
}
