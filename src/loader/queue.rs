//! Download queue bookkeeping.
//!
//! Each `load_buffer_list` call gets its own queue keyed by a batch id, so
//! overlapping calls never share completion counters. A queue is removed
//! as soon as every entry has resolved.

use std::collections::HashMap;
use std::fmt;

use super::BufferKey;

/// Identifies one `load_buffer_list` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BatchId(pub u64);

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "batch-{}", self.0)
    }
}

/// The per-batch record: which URLs were requested and how many resolved.
#[derive(Debug, Clone)]
pub struct DownloadQueue {
    pub urls: Vec<(BufferKey, String)>,
    /// Entries resolved so far, successfully or not.
    pub loaded: usize,
    pub size: usize,
}

/// Outcome of recording one resolved entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueStatus {
    Pending { loaded: usize, size: usize },
    /// Last entry resolved; the queue has been removed.
    Finished { size: usize },
    /// No queue with that id (already finished or never opened).
    Unknown,
}

/// All in-flight download queues.
#[derive(Debug, Default)]
pub struct DownloadQueues {
    queues: HashMap<BatchId, DownloadQueue>,
    next_id: u64,
}

impl DownloadQueues {
    /// Open a queue for `urls` under a fresh batch id.
    pub fn open(&mut self, urls: Vec<(BufferKey, String)>) -> BatchId {
        let id = BatchId(self.next_id);
        self.next_id += 1;
        let size = urls.len();
        self.queues.insert(
            id,
            DownloadQueue {
                urls,
                loaded: 0,
                size,
            },
        );
        id
    }

    /// Count one resolved entry, removing the queue once it is complete.
    pub fn record(&mut self, id: BatchId) -> QueueStatus {
        let Some(queue) = self.queues.get_mut(&id) else {
            return QueueStatus::Unknown;
        };
        queue.loaded += 1;
        if queue.loaded >= queue.size {
            let size = queue.size;
            self.queues.remove(&id);
            QueueStatus::Finished { size }
        } else {
            QueueStatus::Pending {
                loaded: queue.loaded,
                size: queue.size,
            }
        }
    }

    /// Drop a queue without waiting for its entries.
    pub fn close(&mut self, id: BatchId) -> Option<DownloadQueue> {
        self.queues.remove(&id)
    }

    pub fn get(&self, id: BatchId) -> Option<&DownloadQueue> {
        self.queues.get(&id)
    }

    /// `(loaded, size)` for an open queue.
    pub fn progress(&self, id: BatchId) -> Option<(usize, usize)> {
        self.queues.get(&id).map(|q| (q.loaded, q.size))
    }

    /// Ids of every open queue, in creation order.
    pub fn pending(&self) -> Vec<BatchId> {
        let mut ids: Vec<BatchId> = self.queues.keys().copied().collect();
        ids.sort();
        ids
    }
}
