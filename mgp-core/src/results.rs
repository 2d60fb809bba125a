//! Result events and the reporters that render them.
//!
//! The engine never formats anything itself. Walker and workers hand every
//! event to a [`Reporter`] the moment it happens; nothing is buffered, so two
//! matches may surface in any order relative to each other.
use colored::Colorize;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// Symbol printed before a matching path
pub const OK: &str = "\u{2713}";
/// Symbol printed before a path that could not be visited
pub const KO: &str = "\u{00D7}";

/// Informational message emitted when a run is cancelled
pub const ENDED_BY_USER: &str = "Ended by user";

/// A matching line, reported in match-context mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedLine {
    /// 1-based line number
    pub number: usize,
    /// Line text without the trailing newline, invalid UTF-8 replaced
    pub content: String,
}

/// An event produced during a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultEvent {
    Match {
        path: PathBuf,
        line: Option<MatchedLine>,
    },
    Error {
        path: PathBuf,
        cause: String,
    },
    Info(String),
}

/// Receives events from the walker and the workers.
///
/// Implementations are shared by every worker thread and must do their own
/// synchronization.
pub trait Reporter: Send + Sync {
    /// A file matched; `line` is set in match-context mode
    fn report_match(&self, path: &Path, line: Option<&MatchedLine>);

    /// A path could not be visited during the walk
    fn report_error(&self, path: &Path, cause: &dyn fmt::Display);

    /// A free-form informational message
    fn report_info(&self, message: &str);

    /// Dispatches an owned event to the matching method
    fn report(&self, event: &ResultEvent) {
        match event {
            ResultEvent::Match { path, line } => self.report_match(path, line.as_ref()),
            ResultEvent::Error { path, cause } => self.report_error(path, cause),
            ResultEvent::Info(message) => self.report_info(message),
        }
    }
}

/// Writes one line per event to an output stream
pub struct TerminalReporter<W: Write + Send> {
    out: Mutex<W>,
    colored: bool,
}

impl<W: Write + Send> TerminalReporter<W> {
    /// Creates a reporter; `colored = false` is the `-raw` output
    pub fn new(out: W, colored: bool) -> Self {
        Self {
            out: Mutex::new(out),
            colored,
        }
    }

    /// Returns the underlying writer
    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write_lines(&self, lines: &[String]) {
        let mut out = match self.out.lock() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        };
        for line in lines {
            if let Err(e) = writeln!(out, "{}", line) {
                debug!("Failed to write result line: {}", e);
                return;
            }
        }
        let _ = out.flush();
    }

    fn format_match(&self, path: &Path, line: Option<&MatchedLine>) -> String {
        let mut text = path.display().to_string();
        if let Some(line) = line {
            text = format!("{}:{}: {}", text, line.number, line.content);
        }
        if self.colored {
            format!("{} {}", OK.bright_green(), text)
        } else {
            text
        }
    }
}

impl<W: Write + Send> Reporter for TerminalReporter<W> {
    fn report_match(&self, path: &Path, line: Option<&MatchedLine>) {
        self.write_lines(&[self.format_match(path, line)]);
    }

    fn report_error(&self, path: &Path, cause: &dyn fmt::Display) {
        let header = if self.colored {
            format!("{} {}", KO.red(), path.display())
        } else {
            path.display().to_string()
        };
        self.write_lines(&[header, cause.to_string()]);
    }

    fn report_info(&self, message: &str) {
        self.write_lines(&[message.to_string()]);
    }
}

/// Keeps every event in memory, in arrival order
#[derive(Debug, Default)]
pub struct CollectingReporter {
    events: Mutex<Vec<ResultEvent>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all events received so far
    pub fn events(&self) -> Vec<ResultEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Paths of all match events, sorted
    pub fn matched_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self
            .events()
            .into_iter()
            .filter_map(|event| match event {
                ResultEvent::Match { path, .. } => Some(path),
                _ => None,
            })
            .collect();
        paths.sort();
        paths
    }

    fn push(&self, event: ResultEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

impl Reporter for CollectingReporter {
    fn report_match(&self, path: &Path, line: Option<&MatchedLine>) {
        self.push(ResultEvent::Match {
            path: path.to_path_buf(),
            line: line.cloned(),
        });
    }

    fn report_error(&self, path: &Path, cause: &dyn fmt::Display) {
        self.push(ResultEvent::Error {
            path: path.to_path_buf(),
            cause: cause.to_string(),
        });
    }

    fn report_info(&self, message: &str) {
        self.push(ResultEvent::Info(message.to_string()));
    }
}
