pub mod config;
pub mod errors;
pub mod filters;
pub mod metrics;
pub mod results;
pub mod search;

pub use config::ScanConfig;
pub use errors::{SearchError, SearchResult};
pub use metrics::ScanSummary;
pub use results::{CollectingReporter, Reporter, ResultEvent, TerminalReporter};
pub use search::{run, search, CancellationController, StopCondition};
