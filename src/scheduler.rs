//! Background poll loop
//!
//! One tokio task per `OrderBook`, owned through its `JoinHandle` and
//! stopped through a `watch` channel. Each cycle snapshots the watched pairs
//! and fetches every one of them once, with at most `max_concurrent_fetches`
//! requests in flight and a timeout on each. Cycles never overlap.

use crate::{
    adapter::AdapterSet,
    config::OrderBookConfig,
    error::{FetchError, OrderBookError},
    metrics::MetricsRegistry,
    store::QuoteStore,
    types::{Quote, WatchedPair},
};
use futures::stream::{self, StreamExt};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Everything a poll cycle reads or writes
pub(crate) struct PollContext {
    pub(crate) store: Arc<QuoteStore>,
    pub(crate) adapters: AdapterSet,
    pub(crate) metrics: MetricsRegistry,
    pub(crate) fetch_timeout: Duration,
    pub(crate) concurrency: usize,
}

/// Outcome counts of one poll cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub cycle: u64,
    /// Quotes written
    pub updated: usize,
    /// Fetches that failed or timed out, and writes discarded for deleted pairs
    pub failed: usize,
    /// Pairs not attempted because shutdown was requested
    pub skipped: usize,
}

enum FetchOutcome {
    Updated,
    Failed,
    Skipped,
}

impl PollContext {
    pub(crate) fn new(store: Arc<QuoteStore>, adapters: AdapterSet, config: &OrderBookConfig) -> Self {
        let metrics = MetricsRegistry::new(&adapters.exchanges());
        Self {
            store,
            adapters,
            metrics,
            fetch_timeout: config.fetch_timeout,
            concurrency: config.fetch_concurrency(),
        }
    }

    /// Runs one poll cycle over a snapshot of the watched pairs
    pub(crate) async fn run_cycle(
        &self,
        cycle: u64,
        shutdown: &watch::Receiver<bool>,
    ) -> CycleReport {
        let pairs = self.store.watched();
        let outcomes: Vec<FetchOutcome> = stream::iter(pairs)
            .map(move |pair| async move {
                if *shutdown.borrow() {
                    return FetchOutcome::Skipped;
                }
                self.fetch_one(&pair).await
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut report = CycleReport {
            cycle,
            ..CycleReport::default()
        };
        for outcome in outcomes {
            match outcome {
                FetchOutcome::Updated => report.updated += 1,
                FetchOutcome::Failed => report.failed += 1,
                FetchOutcome::Skipped => report.skipped += 1,
            }
        }
        report
    }

    async fn fetch_one(&self, pair: &WatchedPair) -> FetchOutcome {
        let exchange = pair.exchange();
        let Some(adapter) = self.adapters.get(exchange) else {
            tracing::warn!(%exchange, pair = pair.pair(), "No adapter configured for exchange");
            return FetchOutcome::Failed;
        };

        let started = Instant::now();
        let result = match tokio::time::timeout(
            self.fetch_timeout,
            adapter.fetch_top_of_book(&pair.native_symbol),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout),
        };
        self.metrics
            .record(exchange, started.elapsed(), result.is_ok())
            .await;

        match result {
            Ok(book) => {
                if self.store.set(pair, Quote::new(book)) {
                    tracing::debug!(
                        %exchange,
                        pair = pair.pair(),
                        bid = book.bid.price,
                        ask = book.ask.price,
                        "Updated top of book"
                    );
                    FetchOutcome::Updated
                } else {
                    tracing::debug!(%exchange, pair = pair.pair(), "Discarded quote for unwatched pair");
                    FetchOutcome::Failed
                }
            }
            Err(e) => {
                tracing::warn!(
                    %exchange,
                    pair = pair.pair(),
                    symbol = %pair.native_symbol,
                    error = %e,
                    "Failed to fetch top of book"
                );
                FetchOutcome::Failed
            }
        }
    }
}

struct Worker {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

enum SchedulerState {
    Idle,
    Running(Worker),
    Stopped,
}

/// Owns the background poll task of one `OrderBook`
pub struct PollScheduler {
    ctx: Arc<PollContext>,
    state: Mutex<SchedulerState>,
    shutdown_wait: Duration,
}

impl PollScheduler {
    pub(crate) fn new(ctx: Arc<PollContext>, config: &OrderBookConfig) -> Self {
        Self {
            shutdown_wait: ctx.fetch_timeout + config.shutdown_grace,
            ctx,
            state: Mutex::new(SchedulerState::Idle),
        }
    }

    /// Spawns the poll task; the first cycle runs `update_every` from now
    pub fn start(&self, update_every: Duration) -> Result<(), OrderBookError> {
        if update_every.is_zero() {
            return Err(OrderBookError::configuration(
                "update interval must be greater than zero",
            ));
        }
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
            OrderBookError::configuration("start must be called from within a tokio runtime")
        })?;

        let mut state = self.state.lock();
        match *state {
            SchedulerState::Running(_) => return Err(OrderBookError::AlreadyRunning),
            SchedulerState::Stopped => return Err(OrderBookError::SchedulerStopped),
            SchedulerState::Idle => {}
        }

        let (shutdown, shutdown_rx) = watch::channel(false);
        let handle = runtime.spawn(poll_loop(self.ctx.clone(), update_every, shutdown_rx));
        *state = SchedulerState::Running(Worker { shutdown, handle });

        tracing::info!(
            update_every_ms = update_every.as_millis() as u64,
            fetch_timeout_ms = self.ctx.fetch_timeout.as_millis() as u64,
            max_concurrent_fetches = self.ctx.concurrency,
            "Starting top-of-book poll loop"
        );
        Ok(())
    }

    /// Stops the poll task and clears every watched pair and quote
    ///
    /// Waits for the in-flight cycle for at most the fetch timeout plus a
    /// grace period, then aborts the task. Calling it again is a no-op.
    pub async fn stop(&self) {
        let previous = {
            let mut state = self.state.lock();
            std::mem::replace(&mut *state, SchedulerState::Stopped)
        };

        if let SchedulerState::Running(worker) = previous {
            let _ = worker.shutdown.send(true);
            let mut handle = worker.handle;
            if tokio::time::timeout(self.shutdown_wait, &mut handle)
                .await
                .is_err()
            {
                tracing::warn!(
                    wait_ms = self.shutdown_wait.as_millis() as u64,
                    "Poll loop did not stop in time, aborting"
                );
                handle.abort();
                let _ = handle.await;
            }
            tracing::info!("Stopped top-of-book poll loop");
        }

        self.ctx.store.close();
    }

    pub fn is_running(&self) -> bool {
        matches!(*self.state.lock(), SchedulerState::Running(_))
    }

    pub fn is_stopped(&self) -> bool {
        matches!(*self.state.lock(), SchedulerState::Stopped)
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        if let SchedulerState::Running(worker) = &*self.state.get_mut() {
            let _ = worker.shutdown.send(true);
            worker.handle.abort();
        }
    }
}

async fn poll_loop(ctx: Arc<PollContext>, period: Duration, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut cycle: u64 = 0;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.changed() => break,
        }
        if *shutdown.borrow() {
            break;
        }

        cycle += 1;
        let started = Instant::now();
        let report = ctx.run_cycle(cycle, &shutdown).await;
        tracing::debug!(
            cycle = report.cycle,
            updated = report.updated,
            failed = report.failed,
            skipped = report.skipped,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Poll cycle complete"
        );
    }
}
