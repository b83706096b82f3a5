//! A [`Transport`] that records writes for later inspection.

use std::{
    collections::HashSet,
    sync::{
        Arc,
        Mutex,
        MutexGuard,
        PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use gattwire::{ChannelId, Frame, Transport, TransportError};

#[derive(Debug, Default)]
struct FailurePlan {
    attempts: HashSet<usize>,
    channels: HashSet<ChannelId>,
}

#[derive(Debug, Default)]
struct Inner {
    frames: Mutex<Vec<(ChannelId, Frame)>>,
    plan: Mutex<FailurePlan>,
    write_delay: Mutex<Duration>,
    attempts: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Cloneable transport that stores every successful write.
///
/// Clones share state, so a test can hand one clone to a
/// [`Link`](gattwire::Link) and inspect another.
///
/// ```rust
/// use gattwire::{ChannelId, Link, LinkConfig};
/// use gattwire_testing::RecordingTransport;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let transport = RecordingTransport::new();
/// let (link, _inbox) = Link::new(transport.clone(), LinkConfig::default()).expect("link");
/// link.send(&ChannelId::DATA, "hi").expect("send").wait().await.expect("sent");
/// assert_eq!(transport.texts(), vec!["hi"]);
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct RecordingTransport {
    inner: Arc<Inner>,
}

impl RecordingTransport {
    /// Create a transport that accepts every write immediately.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Sleep for `delay` inside every write.
    #[must_use]
    pub fn with_write_delay(self, delay: Duration) -> Self {
        *lock(&self.inner.write_delay) = delay;
        self
    }

    /// Fail the write attempt with zero-based index `attempt`.
    pub fn fail_attempt(&self, attempt: usize) { lock(&self.inner.plan).attempts.insert(attempt); }

    /// Fail every write to `channel` until [`RecordingTransport::heal`].
    pub fn fail_channel(&self, channel: ChannelId) {
        lock(&self.inner.plan).channels.insert(channel);
    }

    /// Clear all injected failures.
    pub fn heal(&self) { *lock(&self.inner.plan) = FailurePlan::default(); }

    /// Frames written successfully, in write order.
    #[must_use]
    pub fn frames(&self) -> Vec<(ChannelId, Frame)> { lock(&self.inner.frames).clone() }

    /// Successful writes rendered as text with padding trimmed.
    ///
    /// # Panics
    ///
    /// Panics if a recorded frame is not UTF-8.
    #[must_use]
    pub fn texts(&self) -> Vec<String> {
        lock(&self.inner.frames)
            .iter()
            .map(|(_, frame)| {
                frame
                    .text()
                    .map(str::to_owned)
                    .unwrap_or_else(|| panic!("recorded frame is not UTF-8: {frame:?}"))
            })
            .collect()
    }

    /// Number of writes attempted, failures included.
    #[must_use]
    pub fn attempts(&self) -> usize { self.inner.attempts.load(Ordering::SeqCst) }

    /// Highest number of writes observed running at the same time.
    #[must_use]
    pub fn peak_in_flight(&self) -> usize { self.inner.peak_in_flight.load(Ordering::SeqCst) }

    /// Forget recorded frames and counters; injected failures stay.
    pub fn clear(&self) {
        lock(&self.inner.frames).clear();
        self.inner.attempts.store(0, Ordering::SeqCst);
        self.inner.peak_in_flight.store(0, Ordering::SeqCst);
    }

    fn should_fail(&self, attempt: usize, channel: &ChannelId) -> bool {
        let plan = lock(&self.inner.plan);
        plan.attempts.contains(&attempt) || plan.channels.contains(channel)
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_frame(&self, channel: &ChannelId, frame: Frame) -> Result<(), TransportError> {
        let attempt = self.inner.attempts.fetch_add(1, Ordering::SeqCst);
        let running = self.inner.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.peak_in_flight.fetch_max(running, Ordering::SeqCst);

        let delay = *lock(&self.inner.write_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let result = if self.should_fail(attempt, channel) {
            Err(TransportError::new(
                channel.clone(),
                format!("injected failure on attempt {attempt}"),
            ))
        } else {
            lock(&self.inner.frames).push((channel.clone(), frame));
            Ok(())
        };
        self.inner.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
