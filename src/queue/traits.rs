//! Work-queue trait and error types

use crate::queue::{QueueCounts, QueuedItem, RunRecord, WorkItem};
use thiserror::Error;

/// Errors that can occur during queue operations
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Failed to serialize payload: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Queued item {id} ({url}) is unroutable: {reason}")]
    CorruptItem {
        id: i64,
        url: String,
        reason: String,
    },

    #[error("Run not found: {0}")]
    RunNotFound(i64),
}

/// Result type for queue operations
pub type QueueResult<T> = Result<T, QueueError>;

/// Durable store of pending crawl work
///
/// Implementations guarantee exactly-once enqueue per URL and survive
/// process restarts. The queue owns a work item from enqueue until it is
/// settled (done or failed); the driver holds it only for the duration of
/// one dispatch.
pub trait WorkQueue {
    /// Adds an item to the queue
    ///
    /// Returns false when an item with the same URL was already enqueued
    /// (dedup is the queue's job, not the caller's). The insert is durable
    /// before this returns.
    fn enqueue(&mut self, item: &WorkItem) -> QueueResult<bool>;

    /// Pops the oldest pending item and marks it in flight
    ///
    /// A row whose stage label, URL, or payload no longer parses is marked
    /// failed and reported as [`QueueError::CorruptItem`] so the caller can
    /// surface it instead of silently dropping the branch.
    fn pop(&mut self) -> QueueResult<Option<QueuedItem>>;

    /// Settles an item after a successful dispatch
    fn mark_done(&mut self, id: i64) -> QueueResult<()>;

    /// Returns an item to pending and bumps its retry count
    ///
    /// Returns the new retry count.
    fn requeue(&mut self, id: i64) -> QueueResult<u32>;

    /// Settles an item whose retries are exhausted
    fn mark_failed(&mut self, id: i64) -> QueueResult<()>;

    /// Number of items waiting to be popped
    fn pending_count(&self) -> QueueResult<u64>;

    /// Counts of items by lifecycle status
    fn counts(&self) -> QueueResult<QueueCounts>;

    /// Returns in-flight rows from an interrupted run to pending
    ///
    /// Called when resuming; returns how many rows were reset.
    fn reset_in_flight(&mut self) -> QueueResult<u64>;

    /// Drops all queued work (fresh runs)
    fn clear(&mut self) -> QueueResult<()>;

    // ===== Run Management =====

    /// Creates a new crawl run, returning its ID
    fn create_run(&mut self, keyword: &str, config_hash: &str) -> QueueResult<i64>;

    /// Marks a run as completed with a finish timestamp
    fn complete_run(&mut self, run_id: i64) -> QueueResult<()>;

    /// Gets the most recent run
    fn latest_run(&self) -> QueueResult<Option<RunRecord>>;
}
