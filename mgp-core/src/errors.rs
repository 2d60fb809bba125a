//! Error types for the scanning engine.
//!
//! Only a handful of conditions are fatal for a run: a missing or unreadable
//! root, a pattern or exclusion glob that does not compile, and bad
//! configuration. Everything discovered while walking is reported through
//! [`crate::results::Reporter`] and the walk carries on; per-file read
//! failures never surface as errors at all.
use std::path::PathBuf;
use thiserror::Error;

/// Result type for search operations
pub type SearchResult<T> = Result<T, SearchError>;

/// Errors that can occur during search operations
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
    #[error("Invalid exclusion glob '{glob}': {reason}")]
    InvalidGlob { glob: String, reason: String },
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to install signal handler: {0}")]
    SignalError(String),
}

impl SearchError {
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound(path.into())
    }

    pub fn permission_denied(path: impl Into<PathBuf>) -> Self {
        Self::PermissionDenied(path.into())
    }

    pub fn invalid_pattern(pattern: impl Into<String>) -> Self {
        Self::InvalidPattern(pattern.into())
    }

    pub fn invalid_glob(glob: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidGlob {
            glob: glob.into(),
            reason: reason.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Maps an I/O error on `path` to the most specific variant available
    pub fn from_io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::file_not_found(path),
            std::io::ErrorKind::PermissionDenied => Self::permission_denied(path),
            _ => Self::IoError(err),
        }
    }
}

impl From<config::ConfigError> for SearchError {
    fn from(err: config::ConfigError) -> Self {
        Self::ConfigError(err.to_string())
    }
}

impl From<ctrlc::Error> for SearchError {
    fn from(err: ctrlc::Error) -> Self {
        Self::SignalError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::path::Path;

    #[test]
    fn test_error_creation() {
        let path = Path::new("test.txt");
        let err = SearchError::file_not_found(path);
        assert!(matches!(err, SearchError::FileNotFound(_)));

        let err = SearchError::permission_denied(path);
        assert!(matches!(err, SearchError::PermissionDenied(_)));

        let err = SearchError::invalid_pattern("Invalid regex");
        assert!(matches!(err, SearchError::InvalidPattern(_)));

        let err = SearchError::invalid_glob("[a", "unclosed class");
        assert!(matches!(err, SearchError::InvalidGlob { .. }));
    }

    #[test]
    fn test_from_io_maps_kind() {
        let err = SearchError::from_io("a", io::Error::new(io::ErrorKind::NotFound, "gone"));
        assert!(matches!(err, SearchError::FileNotFound(_)));

        let err = SearchError::from_io("a", io::Error::new(io::ErrorKind::PermissionDenied, "no"));
        assert!(matches!(err, SearchError::PermissionDenied(_)));

        let err = SearchError::from_io("a", io::Error::new(io::ErrorKind::Other, "boom"));
        assert!(matches!(err, SearchError::IoError(_)));
    }

    #[test]
    fn test_error_messages() {
        let err = SearchError::invalid_pattern("missing closing paren".to_string());
        assert_eq!(err.to_string(), "Invalid pattern: missing closing paren");

        let err = SearchError::config_error("Missing required field".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: Missing required field"
        );

        let err = SearchError::file_not_found("test.txt");
        assert_eq!(err.to_string(), "File not found: test.txt");

        let err = SearchError::invalid_glob("[a", "unclosed");
        assert_eq!(err.to_string(), "Invalid exclusion glob '[a': unclosed");
    }
}
