//! Bounded hand-off queue between the walker and the workers
//!
//! The walker owns the only [`EntrySender`]. Sending blocks while the queue is
//! full, which is what keeps the walker from racing ahead of the workers.
//! Closing the queue consumes the sender, so it can happen at most once and
//! nothing can be sent afterwards. Receivers keep draining buffered entries
//! after the close and only then report the queue as finished.

use crossbeam_channel::{bounded, Receiver, Sender};
use std::fs::{FileType, Metadata};
use std::num::NonZeroUsize;
use std::path::PathBuf;

/// Metadata captured by the walker when it observed the file
#[derive(Debug, Clone)]
pub struct EntryMetadata {
    /// Size in bytes
    pub size: u64,
    /// File type as seen without following symlinks
    pub file_type: FileType,
}

impl EntryMetadata {
    pub fn is_file(&self) -> bool {
        self.file_type.is_file()
    }
}

impl From<&Metadata> for EntryMetadata {
    fn from(metadata: &Metadata) -> Self {
        Self {
            size: metadata.len(),
            file_type: metadata.file_type(),
        }
    }
}

/// A candidate file discovered by the walker
#[derive(Debug, Clone)]
pub struct Entry {
    /// Full path to the file
    pub path: PathBuf,
    pub metadata: EntryMetadata,
}

impl Entry {
    pub fn new(path: PathBuf, metadata: &Metadata) -> Self {
        Self {
            path,
            metadata: EntryMetadata::from(metadata),
        }
    }
}

/// Returned when every receiver is gone, e.g. all workers were cancelled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueDisconnected;

/// Creates a queue holding at most `capacity` entries
pub fn entry_queue(capacity: NonZeroUsize) -> (EntrySender, EntryReceiver) {
    let (sender, receiver) = bounded(capacity.get());
    (
        EntrySender {
            sender,
            capacity: capacity.get(),
        },
        EntryReceiver { receiver },
    )
}

/// Producing half of the queue. Dropping it closes the queue.
#[derive(Debug)]
pub struct EntrySender {
    sender: Sender<Entry>,
    capacity: usize,
}

impl EntrySender {
    /// Sends an entry, blocking while the queue is full.
    ///
    /// Fails only when no receiver is left, in which case the entry is
    /// dropped and the caller should stop producing.
    pub fn send(&self, entry: Entry) -> Result<(), QueueDisconnected> {
        self.sender.send(entry).map_err(|_| QueueDisconnected)
    }

    /// Signals that no more entries will arrive
    pub fn close(self) {
        drop(self);
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.sender.is_full()
    }
}

/// Consuming half of the queue, cloned once per worker
#[derive(Debug, Clone)]
pub struct EntryReceiver {
    receiver: Receiver<Entry>,
}

impl EntryReceiver {
    /// Blocks until an entry is available. `None` once the queue is closed
    /// and drained.
    pub fn recv(&self) -> Option<Entry> {
        self.receiver.recv().ok()
    }

    /// Channel handle for use in `select!`
    pub(crate) fn channel(&self) -> &Receiver<Entry> {
        &self.receiver
    }
}
