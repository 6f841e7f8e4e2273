//! Durable work queue for pending crawl items
//!
//! This module handles all queue persistence, including:
//! - Exactly-once enqueue per URL (UNIQUE-constraint dedup)
//! - FIFO pop with in-flight tracking and crash recovery
//! - Per-item retry counters
//! - Run tracking and resumption support

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteQueue;
pub use traits::{QueueError, QueueResult, WorkQueue};

use crate::state::{Payload, Stage};
use url::Url;

/// One unit of queued crawl work
#[derive(Debug, Clone, PartialEq)]
pub struct WorkItem {
    /// The URL to render
    pub url: Url,

    /// The stage label selecting the extractor and transition
    pub stage: Stage,

    /// The context accumulated by earlier stages
    pub payload: Payload,
}

impl WorkItem {
    pub fn new(url: Url, stage: Stage, payload: Payload) -> Self {
        Self {
            url,
            stage,
            payload,
        }
    }
}

/// A work item popped from the queue, with its row bookkeeping
#[derive(Debug, Clone)]
pub struct QueuedItem {
    /// Queue row ID, used to settle the item after dispatch
    pub id: i64,

    /// Completed attempts beyond the first (0 on the first pop)
    pub retry_count: u32,

    /// The work item itself
    pub item: WorkItem,
}

/// Lifecycle of a queued item row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemStatus {
    Pending,
    InFlight,
    Done,
    Failed,
}

impl ItemStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InFlight => "in_flight",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "in_flight" => Some(Self::InFlight),
            "done" => Some(Self::Done),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Counts of queue rows by status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueCounts {
    pub pending: u64,
    pub in_flight: u64,
    pub done: u64,
    pub failed: u64,
}

/// A recorded crawl run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub keyword: String,
    pub config_hash: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub status: RunStatus,
}

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}
