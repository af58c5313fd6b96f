//! Batch formation and the batch committer.
//!
//! Eligible items are queued in listing order and cut into fixed-size
//! batches; only the final batch of a run may be short. Each resolved batch
//! is written to the store as one unit, strictly in the order the batches
//! were formed, so an interrupted run leaves a committed prefix behind.

use std::collections::{HashSet, VecDeque};

use tracing::{debug, info};

use super::error::SyncError;
use crate::catalog::MediaSummary;
use crate::store::{LocalStore, MediaRow};

/// Batch size used when none is configured.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// FIFO of eligible items waiting to be resolved.
#[derive(Debug)]
pub struct BatchQueue {
    pending: VecDeque<MediaSummary>,
    /// Every identifier ever queued this run, so a listing that returns the
    /// same item on two pages does not fetch or count it twice.
    queued: HashSet<String>,
    batch_size: usize,
}

impl BatchQueue {
    pub fn new(batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            pending: VecDeque::with_capacity(batch_size),
            queued: HashSet::new(),
            batch_size,
        }
    }

    /// Queue an eligible item. Returns `false` if it was already queued.
    pub fn push(&mut self, item: MediaSummary) -> bool {
        if !self.queued.insert(item.id.clone()) {
            debug!(id = %item.id, "Item listed twice in one run, ignoring repeat");
            return false;
        }
        self.pending.push_back(item);
        true
    }

    /// Take the next full batch, if one is ready.
    pub fn next_full_batch(&mut self) -> Option<Vec<MediaSummary>> {
        if self.pending.len() < self.batch_size {
            return None;
        }
        Some(self.pending.drain(..self.batch_size).collect())
    }

    /// Take whatever is left once listing is over.
    pub fn take_remainder(&mut self) -> Option<Vec<MediaSummary>> {
        if self.pending.is_empty() {
            return None;
        }
        Some(self.pending.drain(..).collect())
    }

}

/// Sole writer to the local store during a run.
pub struct BatchCommitter<'a> {
    store: &'a dyn LocalStore,
    batches_committed: u64,
    rows_committed: u64,
}

impl<'a> BatchCommitter<'a> {
    pub fn new(store: &'a dyn LocalStore) -> Self {
        Self {
            store,
            batches_committed: 0,
            rows_committed: 0,
        }
    }

    /// Number the next batch will carry in logs and errors (1-based).
    pub fn next_batch_number(&self) -> u64 {
        self.batches_committed + 1
    }

    /// Write one resolved batch. A failed write is not counted.
    pub async fn commit(&mut self, rows: Vec<MediaRow>) -> Result<usize, SyncError> {
        let batch = self.next_batch_number();
        let count = rows.len();

        self.store
            .write_batch(&rows)
            .await
            .map_err(|source| SyncError::Commit {
                batch,
                rows: count,
                source,
            })?;

        self.batches_committed += 1;
        self.rows_committed += count as u64;
        info!(batch, items = count, total = self.rows_committed, "Committed batch");
        Ok(count)
    }

    pub fn batches_committed(&self) -> u64 {
        self.batches_committed
    }

    pub fn rows_committed(&self) -> u64 {
        self.rows_committed
    }
}
