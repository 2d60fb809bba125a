//! The concurrent scanning engine.
//!
//! A run is made of one producer and a fixed pool of consumers:
//!
//! ```text
//!  PathWalker ──send──▶ EntryQueue (bounded) ──recv──▶ WorkerPool (N threads)
//!      ▲                                                    │
//!      │ StopCondition                       CancelToken ×N │
//!      └──────────────── CancellationController ────────────┘
//! ```
//!
//! The walker runs on the calling thread and closes the queue when it is
//! done. Workers exit once the queue is closed and empty, or as soon as they
//! are cancelled. [`run`] returns after every worker has been joined.
pub mod cancel;
pub mod engine;
pub mod matcher;
pub mod processor;
pub mod queue;
pub mod walker;
pub mod worker;

pub use cancel::{CancellationController, StopCondition};
pub use engine::{run, search};
pub use matcher::PatternMatcher;
pub use processor::{FileProcessor, ScanOutcome, SkipReason};
pub use queue::{entry_queue, Entry, EntryMetadata};
pub use walker::{PathWalker, WalkOutcome};
pub use worker::{WorkerExit, WorkerPool};
