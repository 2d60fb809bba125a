use config::{Config as ConfigBuilder, File};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use crate::errors::{SearchError, SearchResult};

/// One megabyte, the unit of the `-lim` flag
pub const MEGABYTE: u64 = 1_048_576;

/// Worker count used when neither the command line nor a config file sets one
pub const DEFAULT_WORKERS: usize = 100;

/// Per-file size limit used when none is configured, in megabytes
pub const DEFAULT_SIZE_LIMIT_MB: u64 = 100;

/// Capacity of the hand-off queue between the walker and the workers
pub const DEFAULT_QUEUE_CAPACITY: usize = 5000;

/// Configuration for a scan run.
///
/// # Configuration Locations
///
/// Values can be loaded from several files, later ones taking precedence:
/// 1. Global `$HOME/.config/mgp/config.yaml`
/// 2. Local `.mgp.yaml` in the current directory
/// 3. A file named explicitly with `-config`
///
/// Command-line values are applied last via [`ScanConfig::merge_with_cli`].
///
/// # Configuration Format
///
/// ```yaml
/// # Number of worker threads testing file content
/// worker_count: 32
///
/// # Files of this size in megabytes or larger are never read.
/// # `size_limit` takes the same limit in bytes; `size_limit_mb` wins if both are set.
/// size_limit_mb: 10
///
/// # Globs excluded in addition to the VCS defaults
/// exclude_patterns:
///   - "target"
///   - "node_modules"
///
/// ignore_case: false
/// match_context: false
/// raw_output: false
/// queue_capacity: 5000
///
/// # Log level (trace, debug, info, warn, error)
/// log_level: "warn"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScanConfig {
    /// Regular expression tested against every line of every eligible file
    #[serde(default)]
    pub pattern: String,

    /// Directory the walk starts from
    #[serde(default = "default_root_path")]
    pub root_path: PathBuf,

    /// Number of worker threads
    #[serde(default = "default_worker_count")]
    pub worker_count: NonZeroUsize,

    /// Files whose size is greater than or equal to this many bytes are skipped
    #[serde(default = "default_size_limit")]
    pub size_limit: u64,

    /// File-only spelling of the size limit, folded into `size_limit` on load
    #[serde(default, skip_serializing)]
    size_limit_mb: Option<u64>,

    /// Globs matched against the full path or base name of every visited path,
    /// applied on top of [`crate::filters::DEFAULT_EXCLUDES`]
    #[serde(default)]
    pub exclude_patterns: Vec<String>,

    /// Case-insensitive matching
    #[serde(default)]
    pub ignore_case: bool,

    /// Report every matching line instead of stopping at the first one
    #[serde(default)]
    pub match_context: bool,

    /// Plain output without colors or symbols
    #[serde(default)]
    pub raw_output: bool,

    /// Bound of the walker-to-worker queue
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: NonZeroUsize,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_root_path() -> PathBuf {
    PathBuf::from(".")
}

fn default_worker_count() -> NonZeroUsize {
    NonZeroUsize::new(DEFAULT_WORKERS).unwrap_or(NonZeroUsize::MIN)
}

fn default_size_limit() -> u64 {
    DEFAULT_SIZE_LIMIT_MB * MEGABYTE
}

fn default_queue_capacity() -> NonZeroUsize {
    NonZeroUsize::new(DEFAULT_QUEUE_CAPACITY).unwrap_or(NonZeroUsize::MIN)
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            pattern: String::new(),
            root_path: default_root_path(),
            worker_count: default_worker_count(),
            size_limit: default_size_limit(),
            size_limit_mb: None,
            exclude_patterns: Vec::new(),
            ignore_case: false,
            match_context: false,
            raw_output: false,
            queue_capacity: default_queue_capacity(),
            log_level: default_log_level(),
        }
    }
}

/// Values given on the command line. `None` leaves the configured value alone.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub pattern: String,
    pub root_path: PathBuf,
    pub worker_count: Option<NonZeroUsize>,
    pub size_limit_mb: Option<u64>,
    pub exclude_patterns: Vec<String>,
    pub ignore_case: bool,
    pub match_context: bool,
    pub raw_output: bool,
}

impl ScanConfig {
    /// Creates a configuration with defaults for everything but pattern and root
    pub fn new(pattern: impl Into<String>, root_path: impl Into<PathBuf>) -> Self {
        Self {
            pattern: pattern.into(),
            root_path: root_path.into(),
            ..Self::default()
        }
    }

    /// Loads configuration from the default locations plus an explicit file
    pub fn load_from(config_path: Option<&Path>) -> SearchResult<Self> {
        let mut builder = ConfigBuilder::builder();

        let optional_files = [
            dirs::config_dir().map(|p| p.join("mgp/config.yaml")),
            Some(PathBuf::from(".mgp.yaml")),
        ];

        for path in optional_files.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }

        // An explicitly requested file must exist
        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        let mut config: Self = builder.build()?.try_deserialize()?;
        if let Some(mb) = config.size_limit_mb.take() {
            config.size_limit = mb.saturating_mul(MEGABYTE);
        }
        Ok(config)
    }

    /// Applies command-line values on top of file values
    pub fn merge_with_cli(mut self, cli: CliOverrides) -> Self {
        self.pattern = cli.pattern;
        self.root_path = cli.root_path;
        if let Some(workers) = cli.worker_count {
            self.worker_count = workers;
        }
        if let Some(mb) = cli.size_limit_mb {
            self = self.with_size_limit_mb(mb);
        }
        self.exclude_patterns.extend(cli.exclude_patterns);
        self.ignore_case |= cli.ignore_case;
        self.match_context |= cli.match_context;
        self.raw_output |= cli.raw_output;
        self
    }

    /// Sets the size limit from a value in megabytes
    pub fn with_size_limit_mb(mut self, mb: u64) -> Self {
        self.size_limit = mb.saturating_mul(MEGABYTE);
        self
    }

    /// Renders the configuration in the format it is loaded from
    pub fn to_yaml(&self) -> SearchResult<String> {
        serde_yaml::to_string(self).map_err(|e| SearchError::config_error(e.to_string()))
    }

    /// Rejects values the engine cannot run with
    pub fn validate(&self) -> SearchResult<()> {
        if self.pattern.is_empty() {
            return Err(SearchError::config_error("pattern must not be empty"));
        }
        if self.root_path.as_os_str().is_empty() {
            return Err(SearchError::config_error("root path must not be empty"));
        }
        Ok(())
    }
}

/// Splits a comma separated exclusion list such as `"target,*.log"`
pub fn split_exclusions(csv: &str) -> Vec<String> {
    csv.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
