//! Worker threads testing file content
//!
//! Each worker:
//! - Blocks on the entry queue and its cancellation token at the same time
//! - Re-checks, opens and scans one file at a time
//! - Reports matches straight to the shared reporter
//! - Exits when the queue is closed and drained, or when cancelled

use crossbeam_channel::{never, select};
use std::io;
use std::thread::{self, Scope, ScopedJoinHandle};
use tracing::{debug, error, trace};

use super::cancel::{CancelToken, StopCondition};
use super::processor::{FileProcessor, ScanOutcome};
use super::queue::EntryReceiver;
use crate::errors::{SearchError, SearchResult};
use crate::metrics::ScanStats;
use crate::results::Reporter;

/// Why a worker stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    /// The queue was closed and nothing was left in it
    Drained,
    /// A cancellation token or the stop condition ended the loop
    Cancelled,
    /// The worker thread panicked
    Panicked,
}

/// Everything a worker needs, shared by reference across the pool
pub struct WorkerContext<'a> {
    pub queue: EntryReceiver,
    pub token: CancelToken,
    pub stop: StopCondition,
    pub processor: &'a FileProcessor,
    pub reporter: &'a dyn Reporter,
    pub stats: &'a ScanStats,
}

/// A fixed set of scoped worker threads
pub struct WorkerPool<'scope> {
    handles: Vec<(usize, ScopedJoinHandle<'scope, WorkerExit>)>,
}

impl<'scope> WorkerPool<'scope> {
    /// Starts `count` workers inside `scope`.
    ///
    /// If a thread cannot be created, the workers already running are left to
    /// finish once the caller drops the queue sender.
    pub fn spawn<'env>(
        scope: &'scope Scope<'scope, 'env>,
        count: usize,
        ctx: WorkerContext<'env>,
    ) -> SearchResult<Self>
    where
        'env: 'scope,
    {
        let mut handles = Vec::with_capacity(count);

        for id in 0..count {
            let queue = ctx.queue.clone();
            let token = ctx.token.clone();
            let stop = ctx.stop.clone();
            let processor = ctx.processor;
            let reporter = ctx.reporter;
            let stats = ctx.stats;

            let handle = thread::Builder::new()
                .name(format!("mgp-worker-{}", id))
                .spawn_scoped(scope, move || {
                    consume(id, &queue, &token, &stop, processor, reporter, stats)
                })
                .map_err(|e| spawn_error(id, e))?;
            handles.push((id, handle));
        }

        debug!("Started {} workers", handles.len());
        Ok(Self { handles })
    }

    /// Number of workers started
    pub fn worker_count(&self) -> usize {
        self.handles.len()
    }

    /// Waits for every worker to exit
    pub fn join(self) -> Vec<WorkerExit> {
        self.handles
            .into_iter()
            .map(|(id, handle)| match handle.join() {
                Ok(exit) => exit,
                Err(_) => {
                    error!("Worker {} panicked", id);
                    WorkerExit::Panicked
                }
            })
            .collect()
    }
}

fn spawn_error(id: usize, err: io::Error) -> SearchError {
    error!("Failed to start worker {}: {}", id, err);
    SearchError::IoError(err)
}

/// Main worker loop
fn consume(
    id: usize,
    queue: &EntryReceiver,
    token: &CancelToken,
    stop: &StopCondition,
    processor: &FileProcessor,
    reporter: &dyn Reporter,
    stats: &ScanStats,
) -> WorkerExit {
    trace!("Worker {} started", id);

    // Stands in for the token channel if its sender ever goes away
    let disconnected = never::<()>();
    let mut token_open = true;

    loop {
        if stop.is_stopped() {
            trace!("Worker {} saw stop condition", id);
            return WorkerExit::Cancelled;
        }

        let cancel = if token_open {
            token.channel()
        } else {
            &disconnected
        };

        select! {
            recv(queue.channel()) -> msg => match msg {
                Ok(entry) => match processor.process_entry(&entry, reporter) {
                    ScanOutcome::Skipped(reason) => {
                        trace!("Worker {} skipped {}: {:?}", id, entry.path.display(), reason);
                        stats.record_skipped();
                    }
                    outcome => stats.record_scanned(outcome.match_count() as u64),
                },
                Err(_) => {
                    trace!("Worker {} drained the queue", id);
                    return WorkerExit::Drained;
                }
            },
            recv(cancel) -> msg => match msg {
                Ok(()) => {
                    trace!("Worker {} cancelled", id);
                    return WorkerExit::Cancelled;
                }
                Err(_) => token_open = false,
            },
        }
    }
}
