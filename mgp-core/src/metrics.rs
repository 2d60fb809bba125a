use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Counters shared by the walker and every worker
#[derive(Debug, Clone, Default)]
pub struct ScanStats {
    // Walker side
    entries_enqueued: Arc<AtomicU64>,
    paths_excluded: Arc<AtomicU64>,
    files_oversized: Arc<AtomicU64>,
    walk_errors: Arc<AtomicU64>,

    // Worker side
    files_scanned: Arc<AtomicU64>,
    files_matched: Arc<AtomicU64>,
    match_events: Arc<AtomicU64>,
    files_skipped: Arc<AtomicU64>,
}

impl ScanStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_enqueued(&self) {
        self.entries_enqueued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_excluded(&self) {
        self.paths_excluded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_oversized(&self) {
        self.files_oversized.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_walk_error(&self) {
        self.walk_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a file whose content was read to the end or to its first match
    pub fn record_scanned(&self, match_events: u64) {
        self.files_scanned.fetch_add(1, Ordering::Relaxed);
        if match_events > 0 {
            self.files_matched.fetch_add(1, Ordering::Relaxed);
            self.match_events.fetch_add(match_events, Ordering::Relaxed);
        }
    }

    pub fn record_skipped(&self) {
        self.files_skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Takes a point-in-time copy of the counters
    pub fn snapshot(&self, cancelled: bool, elapsed: Duration) -> ScanSummary {
        ScanSummary {
            entries_enqueued: self.entries_enqueued.load(Ordering::Relaxed),
            paths_excluded: self.paths_excluded.load(Ordering::Relaxed),
            files_oversized: self.files_oversized.load(Ordering::Relaxed),
            walk_errors: self.walk_errors.load(Ordering::Relaxed),
            files_scanned: self.files_scanned.load(Ordering::Relaxed),
            files_matched: self.files_matched.load(Ordering::Relaxed),
            match_events: self.match_events.load(Ordering::Relaxed),
            files_skipped: self.files_skipped.load(Ordering::Relaxed),
            cancelled,
            elapsed,
        }
    }
}

/// Outcome of a finished run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanSummary {
    pub entries_enqueued: u64,
    pub paths_excluded: u64,
    pub files_oversized: u64,
    pub walk_errors: u64,
    pub files_scanned: u64,
    pub files_matched: u64,
    pub match_events: u64,
    pub files_skipped: u64,
    /// The run was ended by a cancellation request
    pub cancelled: bool,
    pub elapsed: Duration,
}

impl ScanSummary {
    pub fn log(&self) {
        info!(
            "Scan {} in {:?}: {} files enqueued, {} scanned, {} matched ({} match events), \
             {} skipped, {} excluded, {} over size limit, {} walk errors",
            if self.cancelled { "cancelled" } else { "complete" },
            self.elapsed,
            self.entries_enqueued,
            self.files_scanned,
            self.files_matched,
            self.match_events,
            self.files_skipped,
            self.paths_excluded,
            self.files_oversized,
            self.walk_errors
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_counters_across_threads() {
        let stats = ScanStats::new();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let stats = stats.clone();
                thread::spawn(move || {
                    for i in 0..100 {
                        stats.record_scanned(i % 2);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let summary = stats.snapshot(false, Duration::ZERO);
        assert_eq!(summary.files_scanned, 400);
        assert_eq!(summary.files_matched, 200);
        assert_eq!(summary.match_events, 200);
    }

    #[test]
    fn test_snapshot_walker_counters() {
        let stats = ScanStats::new();
        stats.record_enqueued();
        stats.record_enqueued();
        stats.record_excluded();
        stats.record_oversized();
        stats.record_walk_error();
        stats.record_skipped();

        let summary = stats.snapshot(true, Duration::from_millis(5));
        assert_eq!(summary.entries_enqueued, 2);
        assert_eq!(summary.paths_excluded, 1);
        assert_eq!(summary.files_oversized, 1);
        assert_eq!(summary.walk_errors, 1);
        assert_eq!(summary.files_skipped, 1);
        assert!(summary.cancelled);
    }
}
