//! Batch execution on one shared, bounded worker pool.
//!
//! Requests are spawned onto a rayon pool built once per optimizer. Each
//! worker reports `Started` and `Finished` messages over a crossbeam channel;
//! the calling thread collects them and enforces two limits:
//!
//! - **slot timeout**: a slot still running `slot_timeout` after it started is
//!   marked [`SlotError::Timeout`]
//! - **batch timeout**: once the batch deadline passes, every unfinished slot
//!   is marked [`SlotError::BatchTimeout`]
//!
//! A slot's own timeout starts only when a worker picks it up, so queued
//! slots are bounded by the batch timeout alone. When none is configured it
//! is derived from the slot timeout: enough rounds of `slot_timeout` for
//! every worker to drain its share of the batch, plus one round for a worker
//! stuck behind a request that ignores its deadline.
//!
//! Every request also receives a cooperative [`Deadline`] (the earlier of the
//! two limits). The collector enforces each limit only [`HARD_STOP_GRACE`]
//! later, so a locator that honours its deadline hands back its partial
//! result instead of being cut off. A request that ignores its deadline keeps
//! its worker busy until it returns; its late result is discarded.

use std::any::Any;
use std::fmt::Display;
use std::num::NonZeroUsize;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};
use kairos_core::Deadline;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, warn};

use crate::error::{BatchError, SlotError};

/// Slack between a request's cooperative deadline and the collector's cut-off.
pub const HARD_STOP_GRACE: Duration = Duration::from_millis(50);

/// Result of one batch slot.
pub type SlotOutcome<T> = Result<T, SlotError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    /// Worker threads; `None` uses the available parallelism.
    pub workers: Option<usize>,
    /// Limit for one request, measured from when a worker picks it up.
    pub slot_timeout: Duration,
    /// Limit for the whole batch, measured from submission. `None` derives
    /// one from `slot_timeout`, the batch size and the worker count.
    pub batch_timeout: Option<Duration>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            workers: None,
            slot_timeout: Duration::from_secs(5),
            batch_timeout: None,
        }
    }
}

impl BatchConfig {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.workers == Some(0) {
            return Err("workers must be > 0");
        }
        if self.slot_timeout.is_zero() {
            return Err("slot_timeout must be > 0");
        }
        if self.batch_timeout.is_some_and(|t| t.is_zero()) {
            return Err("batch_timeout must be > 0");
        }
        Ok(())
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

enum Message<T> {
    Started(usize, Instant),
    Finished(usize, SlotOutcome<T>),
}

/// Runs batches of independent requests on a bounded pool.
///
/// Cloning shares the pool.
#[derive(Clone)]
pub struct BatchOptimizer {
    pool: Arc<ThreadPool>,
    config: BatchConfig,
}

impl std::fmt::Debug for BatchOptimizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchOptimizer")
            .field("workers", &self.workers())
            .field("config", &self.config)
            .finish()
    }
}

impl BatchOptimizer {
    pub fn new(config: BatchConfig) -> Result<Self, BatchError> {
        config.validate().map_err(BatchError::InvalidConfig)?;
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.workers.unwrap_or_else(default_workers))
            .thread_name(|i| format!("kairos-batch-{i}"))
            .build()?;
        Ok(Self {
            pool: Arc::new(pool),
            config,
        })
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Limit for a batch of `count` requests.
    pub fn batch_timeout(&self, count: usize) -> Duration {
        self.config.batch_timeout.unwrap_or_else(|| {
            let rounds = count.div_ceil(self.workers().max(1)) + 1;
            self.config
                .slot_timeout
                .saturating_mul(u32::try_from(rounds).unwrap_or(u32::MAX))
        })
    }

    /// Run `f` over every request and return one outcome per request, in
    /// request order. A failing, panicking or slow request only fails its
    /// own slot.
    pub fn run_batch<R, T, E, F>(&self, requests: Vec<R>, f: F) -> Vec<SlotOutcome<T>>
    where
        R: Send + 'static,
        T: Send + 'static,
        E: Display,
        F: Fn(R, &Deadline) -> Result<T, E> + Send + Sync + 'static,
    {
        let count = requests.len();
        if count == 0 {
            return Vec::new();
        }
        let submitted = Instant::now();
        let batch_deadline = Deadline::after(self.batch_timeout(count));
        let slot_timeout = self.config.slot_timeout;

        let (tx, rx) = crossbeam_channel::unbounded::<Message<T>>();
        let f = Arc::new(f);
        for (idx, request) in requests.into_iter().enumerate() {
            let tx = tx.clone();
            let f = Arc::clone(&f);
            self.pool.spawn(move || {
                // The collector may have returned already; send failures are moot.
                if batch_deadline.is_expired() {
                    let _ = tx.send(Message::Finished(idx, Err(SlotError::BatchTimeout)));
                    return;
                }
                let _ = tx.send(Message::Started(idx, Instant::now()));
                let deadline = Deadline::after(slot_timeout).min(batch_deadline);
                let outcome = match catch_unwind(AssertUnwindSafe(|| f(request, &deadline))) {
                    Ok(Ok(value)) => Ok(value),
                    Ok(Err(e)) => Err(SlotError::Failed(e.to_string())),
                    Err(payload) => Err(SlotError::Panicked(panic_message(payload.as_ref()))),
                };
                let _ = tx.send(Message::Finished(idx, outcome));
            });
        }
        drop(tx);

        let results = Collector::new(count, slot_timeout, batch_deadline).run(&rx);

        let failed = results.iter().filter(|r| r.is_err()).count();
        debug!(
            slots = count,
            failed,
            elapsed_ms = submitted.elapsed().as_millis() as u64,
            "batch complete"
        );
        results
    }
}

// ---------------------------------------------------------------------------
// Collector
// ---------------------------------------------------------------------------

struct Collector<T> {
    slots: Vec<Option<SlotOutcome<T>>>,
    started: Vec<Option<Instant>>,
    pending: usize,
    slot_timeout: Duration,
    batch_cutoff: Option<Instant>,
}

impl<T> Collector<T> {
    fn new(count: usize, slot_timeout: Duration, batch_deadline: Deadline) -> Self {
        Self {
            slots: (0..count).map(|_| None).collect(),
            started: vec![None; count],
            pending: count,
            slot_timeout,
            batch_cutoff: batch_deadline.instant().map(|at| at + HARD_STOP_GRACE),
        }
    }

    fn resolve(&mut self, idx: usize, outcome: SlotOutcome<T>) {
        if let Some(slot) = self.slots.get_mut(idx)
            && slot.is_none()
        {
            *slot = Some(outcome);
            self.pending -= 1;
        }
    }

    /// Fail every slot past its limit. Returns the earliest instant at which
    /// another limit could trip.
    fn expire(&mut self, now: Instant) -> Option<Instant> {
        if self.batch_cutoff.is_some_and(|cutoff| now >= cutoff) {
            for idx in 0..self.slots.len() {
                if self.slots[idx].is_none() {
                    warn!(slot = idx, "batch deadline passed; slot failed");
                    self.resolve(idx, Err(SlotError::BatchTimeout));
                }
            }
            return None;
        }

        let mut wake = self.batch_cutoff;
        for idx in 0..self.slots.len() {
            let Some(start) = self.started[idx] else {
                continue;
            };
            if self.slots[idx].is_some() {
                continue;
            }
            let limit = start + self.slot_timeout + HARD_STOP_GRACE;
            if now >= limit {
                let timeout_ms = self.slot_timeout.as_millis() as u64;
                warn!(slot = idx, timeout_ms, "batch slot timed out");
                self.resolve(idx, Err(SlotError::Timeout { timeout_ms }));
            } else {
                wake = Some(wake.map_or(limit, |w| w.min(limit)));
            }
        }
        wake
    }

    fn run(mut self, rx: &Receiver<Message<T>>) -> Vec<SlotOutcome<T>> {
        while self.pending > 0 {
            let now = Instant::now();
            let wake = self.expire(now);
            if self.pending == 0 {
                break;
            }
            let message = match wake {
                Some(at) => rx.recv_timeout(at.saturating_duration_since(now)),
                None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };
            match message {
                Ok(Message::Started(idx, at)) => {
                    if let Some(slot) = self.started.get_mut(idx) {
                        *slot = Some(at);
                    }
                }
                Ok(Message::Finished(idx, outcome)) => self.resolve(idx, outcome),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        self.slots
            .into_iter()
            .map(|slot| {
                slot.unwrap_or_else(|| {
                    Err(SlotError::Failed("worker exited without a result".into()))
                })
            })
            .collect()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}
