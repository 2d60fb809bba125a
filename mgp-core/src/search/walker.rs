use ignore::{DirEntry, WalkBuilder};
use std::path::PathBuf;
use tracing::{debug, trace, warn};

use super::cancel::StopCondition;
use super::queue::{Entry, EntrySender};
use crate::filters::{strip_current_dir, ExclusionSet};
use crate::metrics::ScanStats;
use crate::results::Reporter;

/// How a walk ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkOutcome {
    /// Every reachable path was visited
    Completed,
    /// The stop condition was raised mid-walk
    Cancelled,
    /// No worker was left to take entries
    Disconnected,
}

/// Single producer: visits the tree depth-first and feeds eligible files to
/// the workers.
#[derive(Debug, Clone)]
pub struct PathWalker {
    root: PathBuf,
    excludes: ExclusionSet,
    size_limit: u64,
    stop: StopCondition,
    stats: ScanStats,
}

impl PathWalker {
    pub fn new(
        root: impl Into<PathBuf>,
        excludes: ExclusionSet,
        size_limit: u64,
        stop: StopCondition,
        stats: ScanStats,
    ) -> Self {
        Self {
            root: root.into(),
            excludes,
            size_limit,
            stop,
            stats,
        }
    }

    /// Walks the tree, sending every eligible file into `queue`.
    ///
    /// The queue is closed when this returns, whatever the outcome.
    pub fn walk(&self, queue: EntrySender, reporter: &dyn Reporter) -> WalkOutcome {
        let outcome = self.walk_into(&queue, reporter);
        queue.close();
        debug!("Walk of {} finished: {:?}", self.root.display(), outcome);
        outcome
    }

    fn walk_into(&self, queue: &EntrySender, reporter: &dyn Reporter) -> WalkOutcome {
        let excludes = self.excludes.clone();
        let stop = self.stop.clone();
        let stats = self.stats.clone();

        // Pruning here keeps excluded subtrees from ever being read. The
        // filter is never consulted for the root itself.
        let walker = WalkBuilder::new(&self.root)
            .standard_filters(false)
            .follow_links(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(move |entry| {
                if stop.is_stopped() {
                    return false;
                }
                if excludes.is_excluded(entry.path()) {
                    debug!("Excluded: {}", entry.path().display());
                    stats.record_excluded();
                    return false;
                }
                true
            })
            .build();

        for result in walker {
            if self.stop.is_stopped() {
                return WalkOutcome::Cancelled;
            }

            let entry = match result {
                Ok(entry) => entry,
                Err(err) => {
                    self.report_walk_error(err, reporter);
                    continue;
                }
            };

            if entry.depth() == 0 && self.excludes.is_excluded(entry.path()) {
                debug!("Root is excluded: {}", entry.path().display());
                self.stats.record_excluded();
                return WalkOutcome::Completed;
            }

            if let Some(candidate) = self.candidate(entry, reporter) {
                if queue.is_full() {
                    trace!("Queue full, waiting for workers");
                }
                if queue.send(candidate).is_err() {
                    debug!("All workers gone, stopping walk");
                    return WalkOutcome::Disconnected;
                }
                self.stats.record_enqueued();
            }
        }

        WalkOutcome::Completed
    }

    /// Turns a visited path into a queue entry if it is an eligible file
    fn candidate(&self, entry: DirEntry, reporter: &dyn Reporter) -> Option<Entry> {
        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(err) => {
                self.report_walk_error(err, reporter);
                return None;
            }
        };

        if metadata.is_dir() {
            return None;
        }
        if !metadata.file_type().is_file() {
            trace!("Not a regular file: {}", entry.path().display());
            return None;
        }
        if metadata.len() >= self.size_limit {
            trace!(
                "Over size limit ({} bytes): {}",
                metadata.len(),
                entry.path().display()
            );
            self.stats.record_oversized();
            return None;
        }

        Some(Entry::new(
            strip_current_dir(entry.path()).to_path_buf(),
            &metadata,
        ))
    }

    fn report_walk_error(&self, err: ignore::Error, reporter: &dyn Reporter) {
        self.stats.record_walk_error();
        let (path, cause) = split_error(&err);
        let path = path.unwrap_or_else(|| self.root.clone());
        let path = strip_current_dir(&path);
        warn!("Cannot access {}: {}", path.display(), cause);
        reporter.report_error(path, &cause);
    }
}

/// Separates the path an `ignore` error refers to from its message
fn split_error(err: &ignore::Error) -> (Option<PathBuf>, String) {
    match err {
        ignore::Error::WithPath { path, err } => {
            let (_, cause) = split_error(err);
            (Some(path.clone()), cause)
        }
        ignore::Error::WithDepth { err, .. } | ignore::Error::WithLineNumber { err, .. } => {
            split_error(err)
        }
        ignore::Error::Loop { child, .. } => (Some(child.clone()), err.to_string()),
        other => (None, other.to_string()),
    }
}
