use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::cancel::{CancellationController, StopCondition};
use super::matcher::PatternMatcher;
use super::processor::FileProcessor;
use super::queue::entry_queue;
use super::walker::{PathWalker, WalkOutcome};
use super::worker::{WorkerContext, WorkerExit, WorkerPool};
use crate::config::ScanConfig;
use crate::errors::{SearchError, SearchResult};
use crate::filters::ExclusionSet;
use crate::metrics::{ScanStats, ScanSummary};
use crate::results::{Reporter, ENDED_BY_USER};

/// Scans `config.root_path` with a private, unarmed cancellation controller
pub fn search(config: &ScanConfig, reporter: &dyn Reporter) -> SearchResult<ScanSummary> {
    let controller = CancellationController::new(StopCondition::new(), config.worker_count.get());
    run(config, &controller, reporter)
}

/// Runs one scan and blocks until the walk is over and every worker has exited.
///
/// `controller` must be sized for `config.worker_count` workers. Arm it before
/// calling this if OS signals should stop the scan.
pub fn run(
    config: &ScanConfig,
    controller: &CancellationController,
    reporter: &dyn Reporter,
) -> SearchResult<ScanSummary> {
    config.validate()?;
    let worker_count = config.worker_count.get();
    if controller.worker_count() < worker_count {
        return Err(SearchError::config_error(format!(
            "cancellation controller serves {} workers, {} requested",
            controller.worker_count(),
            worker_count
        )));
    }

    let matcher = Arc::new(PatternMatcher::new(&config.pattern, config.ignore_case)?);
    let excludes = ExclusionSet::new(&config.exclude_patterns)?;
    check_root(&config.root_path)?;

    info!(
        "Starting scan of {} for {:?} (ignore case: {}) with {} workers",
        config.root_path.display(),
        matcher.as_str(),
        matcher.ignore_case(),
        worker_count
    );
    debug!("{} exclusion globs in effect", excludes.glob_count());
    let started = Instant::now();

    let stats = ScanStats::new();
    let stop = controller.stop_condition().clone();
    let processor = FileProcessor::new(matcher, config.match_context);
    let walker = PathWalker::new(
        &config.root_path,
        excludes,
        config.size_limit,
        stop.clone(),
        stats.clone(),
    );

    let (walk, exits) = thread::scope(|scope| -> SearchResult<(WalkOutcome, Vec<WorkerExit>)> {
        let (sender, receiver) = entry_queue(config.queue_capacity);

        // Workers are running before the first entry is produced
        let pool = WorkerPool::spawn(
            scope,
            worker_count,
            WorkerContext {
                queue: receiver,
                token: controller.token(),
                stop,
                processor: &processor,
                reporter,
                stats: &stats,
            },
        )?;
        debug!(
            "{} workers waiting on a queue of {}",
            pool.worker_count(),
            sender.capacity()
        );

        let walk = walker.walk(sender, reporter);
        Ok((walk, pool.join()))
    })?;

    debug!("Walk outcome: {:?}", walk);
    let panicked = exits.iter().filter(|e| **e == WorkerExit::Panicked).count();
    if panicked > 0 {
        warn!("{} workers panicked", panicked);
    }

    let cancelled = controller.is_cancelled();
    if cancelled {
        reporter.report_info(ENDED_BY_USER);
    }

    let summary = stats.snapshot(cancelled, started.elapsed());
    summary.log();
    Ok(summary)
}

/// The root must exist and be readable before anything is scanned
fn check_root(root: &Path) -> SearchResult<()> {
    let metadata = fs::metadata(root).map_err(|e| SearchError::from_io(root, e))?;
    if metadata.is_dir() {
        fs::read_dir(root).map_err(|e| SearchError::from_io(root, e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::CollectingReporter;
    use std::num::NonZeroUsize;
    use tempfile::tempdir;

    #[test]
    fn test_search_reports_matches() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "test line\ntest line 2\n").unwrap();
        fs::write(dir.path().join("b.txt"), "nothing\n").unwrap();

        let mut config = ScanConfig::new("test", dir.path());
        config.worker_count = NonZeroUsize::new(2).unwrap();

        let reporter = CollectingReporter::new();
        let summary = search(&config, &reporter).unwrap();

        assert_eq!(reporter.matched_paths(), vec![dir.path().join("a.txt")]);
        assert_eq!(summary.files_matched, 1);
        assert_eq!(summary.match_events, 1);
        assert_eq!(summary.files_scanned, 2);
        assert!(!summary.cancelled);
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let dir = tempdir().unwrap();
        let config = ScanConfig::new("foo", dir.path().join("missing"));

        let reporter = CollectingReporter::new();
        let err = search(&config, &reporter).unwrap_err();
        assert!(matches!(err, SearchError::FileNotFound(_)));
        assert!(reporter.events().is_empty());
    }

    #[test]
    fn test_invalid_pattern_is_fatal() {
        let dir = tempdir().unwrap();
        let config = ScanConfig::new("(", dir.path());
        let err = search(&config, &CollectingReporter::new()).unwrap_err();
        assert!(matches!(err, SearchError::InvalidPattern(_)));
    }

    #[test]
    fn test_undersized_controller_is_rejected() {
        let dir = tempdir().unwrap();
        let mut config = ScanConfig::new("foo", dir.path());
        config.worker_count = NonZeroUsize::new(8).unwrap();

        let controller = CancellationController::new(StopCondition::new(), 2);
        let err = run(&config, &controller, &CollectingReporter::new()).unwrap_err();
        assert!(matches!(err, SearchError::ConfigError(_)));
    }

    #[test]
    fn test_cancelled_before_start_ends_by_user() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "foo\n").unwrap();
        let mut config = ScanConfig::new("foo", dir.path());
        config.worker_count = NonZeroUsize::new(2).unwrap();

        let controller = CancellationController::new(StopCondition::new(), 2);
        controller.cancel();

        let reporter = CollectingReporter::new();
        let summary = run(&config, &controller, &reporter).unwrap();

        assert!(summary.cancelled);
        assert_eq!(summary.entries_enqueued, 0);
        assert!(reporter.matched_paths().is_empty());
        assert_eq!(
            reporter.events().last(),
            Some(&crate::results::ResultEvent::Info(ENDED_BY_USER.to_string()))
        );
    }
}
