use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;
use tracing::trace;

use super::matcher::PatternMatcher;
use super::queue::Entry;
use crate::results::{MatchedLine, Reporter};

// Constants for file processing
const BUFFER_CAPACITY: usize = 65536;
const LINE_CAPACITY: usize = 256;

/// Why an entry was dropped without a verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The path is no longer a regular file
    NotRegular,
    /// Metadata could not be read when re-checking the entry
    Metadata(io::ErrorKind),
    /// The file could not be opened
    Open(io::ErrorKind),
    /// Reading failed before anything matched
    Read(io::ErrorKind),
}

/// Result of testing one file against the pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Number of match events emitted for the file
    Matched(usize),
    NoMatch,
    /// The file was skipped silently; nothing was reported
    Skipped(SkipReason),
}

impl ScanOutcome {
    /// Match events emitted for the file
    pub fn match_count(&self) -> usize {
        match self {
            ScanOutcome::Matched(n) => *n,
            _ => 0,
        }
    }
}

/// Tests file content line by line against the pattern
#[derive(Debug, Clone)]
pub struct FileProcessor {
    matcher: Arc<PatternMatcher>,
    match_context: bool,
}

impl FileProcessor {
    /// Creates a processor; with `match_context` every matching line is reported
    pub fn new(matcher: Arc<PatternMatcher>, match_context: bool) -> Self {
        Self {
            matcher,
            match_context,
        }
    }

    /// Tests one entry and reports its matches.
    ///
    /// Open and read failures never reach the reporter; they come back as
    /// [`ScanOutcome::Skipped`].
    pub fn process_entry(&self, entry: &Entry, reporter: &dyn Reporter) -> ScanOutcome {
        let path = entry.path.as_path();
        trace!("Processing file: {}", path.display());

        if !entry.metadata.is_file() {
            return ScanOutcome::Skipped(SkipReason::NotRegular);
        }

        // The file may have been replaced since the walker saw it
        match fs::symlink_metadata(path) {
            Ok(metadata) if metadata.file_type().is_file() => {}
            Ok(_) => return ScanOutcome::Skipped(SkipReason::NotRegular),
            Err(e) => return ScanOutcome::Skipped(SkipReason::Metadata(e.kind())),
        }

        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) => return ScanOutcome::Skipped(SkipReason::Open(e.kind())),
        };

        self.scan_lines(path, BufReader::with_capacity(BUFFER_CAPACITY, file), reporter)
    }

    fn scan_lines<R: BufRead>(
        &self,
        path: &Path,
        mut reader: R,
        reporter: &dyn Reporter,
    ) -> ScanOutcome {
        let mut line = Vec::with_capacity(LINE_CAPACITY);
        let mut line_number = 0usize;
        let mut matches = 0usize;

        loop {
            line.clear();
            match reader.read_until(b'\n', &mut line) {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    if matches > 0 {
                        // Already reported matches stand
                        break;
                    }
                    return ScanOutcome::Skipped(SkipReason::Read(e.kind()));
                }
            }
            line_number += 1;

            let text = trim_line_ending(&line);
            if !self.matcher.is_match(text) {
                continue;
            }

            matches += 1;
            if !self.match_context {
                reporter.report_match(path, None);
                break;
            }

            let matched = MatchedLine {
                number: line_number,
                content: String::from_utf8_lossy(text).into_owned(),
            };
            reporter.report_match(path, Some(&matched));
        }

        if matches == 0 {
            ScanOutcome::NoMatch
        } else {
            ScanOutcome::Matched(matches)
        }
    }
}

fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
