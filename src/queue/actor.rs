//! Drain task owning the pending operations.

use std::{
    any::Any,
    collections::VecDeque,
    panic::AssertUnwindSafe,
    sync::{Arc, atomic::Ordering},
    time::Duration,
};

use futures::FutureExt;
use leaky_bucket::RateLimiter;
use tokio::{
    sync::{mpsc, oneshot},
    time::{Instant, sleep_until},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use super::{Command, Operation, OrderedQueueBuilder, QueueStats};

pub(super) struct QueueActor {
    rx: mpsc::UnboundedReceiver<Command>,
    pending: VecDeque<Operation>,
    flush_waiters: Vec<oneshot::Sender<()>>,
    running: bool,
    auto_start: bool,
    inter_frame_delay: Duration,
    limiter: Option<RateLimiter>,
    last_finished: Option<Instant>,
    token: CancellationToken,
    stats: Arc<QueueStats>,
}

impl QueueActor {
    pub(super) fn new(
        builder: OrderedQueueBuilder,
        rx: mpsc::UnboundedReceiver<Command>,
        stats: Arc<QueueStats>,
    ) -> Self {
        let limiter = builder.rate.map(|rate| {
            RateLimiter::builder()
                .initial(rate)
                .refill(rate)
                .interval(Duration::from_secs(1))
                .max(rate)
                .build()
        });
        Self {
            rx,
            pending: VecDeque::new(),
            flush_waiters: Vec::new(),
            running: false,
            auto_start: builder.auto_start,
            inter_frame_delay: builder.inter_frame_delay,
            limiter,
            last_finished: None,
            token: builder.token,
            stats,
        }
    }

    pub(super) async fn run(mut self) {
        debug!("ordered queue started");
        loop {
            if self.running && !self.pending.is_empty() {
                if !self.pace().await {
                    break;
                }
                self.absorb_commands();
                if let Some(op) = self.pending.pop_front() {
                    self.publish();
                    self.execute(op).await;
                    self.absorb_commands();
                }
                if self.token.is_cancelled() {
                    break;
                }
                continue;
            }

            if self.running {
                self.running = false;
                self.publish();
                debug!("ordered queue drained");
            }
            self.release_flush_waiters();

            tokio::select! {
                biased;
                () = self.token.cancelled() => break,
                command = self.rx.recv() => match command {
                    Some(command) => self.apply(command),
                    None => break,
                },
            }
        }

        let discarded = self.pending.len();
        self.pending.clear();
        self.running = false;
        self.publish();
        debug!(discarded, "ordered queue shut down");
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::Enqueue(ops) => {
                self.pending.extend(ops);
                if self.auto_start {
                    self.running = true;
                }
            }
            Command::Start => {
                if !self.running {
                    debug!(pending = self.pending.len(), "ordered queue draining");
                    self.running = true;
                }
            }
            Command::Stop => {
                let discarded = self.pending.len();
                self.pending.clear();
                debug!(discarded, "ordered queue stopped");
            }
            Command::Flush(waiter) => self.flush_waiters.push(waiter),
        }
        self.publish();
    }

    fn absorb_commands(&mut self) {
        while let Ok(command) = self.rx.try_recv() {
            self.apply(command);
        }
    }

    /// Wait out pacing limits; returns `false` if cancelled meanwhile.
    async fn pace(&mut self) -> bool {
        if let Some(last) = self.last_finished
            && !self.inter_frame_delay.is_zero()
        {
            tokio::select! {
                biased;
                () = self.token.cancelled() => return false,
                () = sleep_until(last + self.inter_frame_delay) => {}
            }
        }
        if let Some(limiter) = &self.limiter {
            tokio::select! {
                biased;
                () = self.token.cancelled() => return false,
                () = limiter.acquire(1) => {}
            }
        }
        true
    }

    async fn execute(&mut self, op: Operation) {
        if let Err(panic) = AssertUnwindSafe(op).catch_unwind().await {
            let panic_msg = panic_message(panic.as_ref());
            // Emit via both `log` and `tracing` for tests that capture either.
            log::error!("queued operation panicked: panic={panic_msg}");
            error!(panic = %panic_msg, "queued operation panicked");
        }
        self.last_finished = Some(Instant::now());
        self.stats.executed.fetch_add(1, Ordering::AcqRel);
    }

    fn release_flush_waiters(&mut self) {
        if !self.pending.is_empty() {
            return;
        }
        for waiter in self.flush_waiters.drain(..) {
            let _ = waiter.send(());
        }
    }

    fn publish(&self) {
        self.stats
            .pending
            .store(self.pending.len(), Ordering::Release);
        self.stats.running.store(self.running, Ordering::Release);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else {
        "non-string panic payload"
    }
}
