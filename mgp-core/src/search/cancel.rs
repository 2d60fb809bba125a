//! Cooperative cancellation.
//!
//! A run is stopped by flipping a shared [`StopCondition`], which the walker
//! checks before every path it visits, and by handing one wake-up token to
//! each worker so that a worker parked on an empty queue returns straight
//! away. Nothing is interrupted mid-file: a worker busy reading finishes that
//! entry and exits when it next looks at the queue.

use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

use crate::errors::SearchResult;

/// Monotonic stop flag shared by the walker and all workers
#[derive(Debug, Clone, Default)]
pub struct StopCondition {
    stopped: Arc<AtomicBool>,
}

impl StopCondition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a stop has been requested
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Sets the flag. Returns `true` only for the call that flipped it.
    pub fn stop(&self) -> bool {
        !self.stopped.swap(true, Ordering::AcqRel)
    }
}

/// Per-worker cancellation token receiver
#[derive(Debug, Clone)]
pub struct CancelToken {
    receiver: Receiver<()>,
}

impl CancelToken {
    pub(crate) fn channel(&self) -> &Receiver<()> {
        &self.receiver
    }
}

/// Turns an external termination request into a stop of the run
#[derive(Debug)]
pub struct CancellationController {
    stop: StopCondition,
    tokens: Sender<()>,
    token_rx: Receiver<()>,
    worker_count: usize,
}

impl CancellationController {
    /// Creates a controller for `worker_count` workers sharing `stop`
    pub fn new(stop: StopCondition, worker_count: usize) -> Self {
        let (tokens, token_rx) = bounded(worker_count.max(1));
        Self {
            stop,
            tokens,
            token_rx,
            worker_count,
        }
    }

    /// Installs the process-wide SIGINT/SIGTERM handler.
    ///
    /// The handler can be installed once per process; a second call fails
    /// with [`crate::SearchError::SignalError`].
    pub fn arm(self: &Arc<Self>) -> SearchResult<()> {
        let controller = Arc::clone(self);
        ctrlc::set_handler(move || {
            controller.cancel();
        })?;
        debug!("Cancellation armed for {} workers", self.worker_count);
        Ok(())
    }

    /// Requests cancellation. Only the first call has any effect; it returns
    /// `true` in that case.
    pub fn cancel(&self) -> bool {
        if !self.stop.stop() {
            return false;
        }
        info!("Termination requested, stopping scan");

        // Capacity equals the worker count, so this never blocks
        for _ in 0..self.worker_count {
            if self.tokens.try_send(()).is_err() {
                break;
            }
        }
        true
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.stop.is_stopped()
    }

    /// The stop flag this controller flips
    pub fn stop_condition(&self) -> &StopCondition {
        &self.stop
    }

    /// A token receiver for one worker
    pub fn token(&self) -> CancelToken {
        CancelToken {
            receiver: self.token_rx.clone(),
        }
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }
}
