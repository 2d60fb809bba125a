use regex::bytes::{Regex, RegexBuilder};

use crate::errors::{SearchError, SearchResult};

/// Compiled pattern shared read-only by every worker.
///
/// Matching works on raw bytes so files that are not valid UTF-8 are still
/// searched instead of being rejected.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    regex: Regex,
    ignore_case: bool,
}

impl PatternMatcher {
    /// Compiles `pattern` as a regular expression
    pub fn new(pattern: &str, ignore_case: bool) -> SearchResult<Self> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(ignore_case)
            .build()
            .map_err(|e| SearchError::invalid_pattern(e.to_string()))?;

        Ok(Self { regex, ignore_case })
    }

    /// Whether `line` contains a match
    pub fn is_match(&self, line: &[u8]) -> bool {
        self.regex.is_match(line)
    }

    /// The pattern as given
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    pub fn ignore_case(&self) -> bool {
        self.ignore_case
    }
}
