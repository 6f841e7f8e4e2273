//! Output records and sinks
//!
//! This module defines the terminal records produced by the pipeline and
//! the sinks that persist them:
//! - JSON-lines dataset files for real runs
//! - An in-memory sink for tests

mod jsonl;
mod memory;
pub mod stats;
mod traits;

pub use jsonl::JsonlSink;
pub use memory::MemorySink;
pub use stats::{print_summary, CrawlStats};
pub use traits::{OutputError, OutputResult, Sink};

use crate::queue::QueuedItem;
use chrono::Utc;
use serde::Serialize;

/// Terminal record: one seller offer with the accumulated crawl context
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OfferRecord {
    pub seller: String,
    pub price: String,
    pub shipping: String,

    /// Null for listings without a description container
    pub description: Option<String>,

    pub title: Option<String>,

    #[serde(rename = "itemUrl")]
    pub item_url: String,

    pub keyword: String,
}

/// Diagnostics for a work item that could not be completed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureDiagnostics {
    pub url: String,
    pub stage: String,

    #[serde(rename = "retryCount")]
    pub retry_count: u32,

    pub error: String,

    #[serde(rename = "failedAt")]
    pub failed_at: String,
}

/// Failure record pushed to the sink in place of offer output
///
/// Failed branches show up in the dataset under a `#debug` key instead of
/// vanishing silently.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebugRecord {
    #[serde(rename = "#debug")]
    pub diagnostics: FailureDiagnostics,
}

impl DebugRecord {
    /// Builds the record for an item retried past its budget
    pub fn for_exhausted(queued: &QueuedItem, error: &str) -> Self {
        Self {
            diagnostics: FailureDiagnostics {
                url: queued.item.url.to_string(),
                stage: queued.item.stage.as_label().to_string(),
                retry_count: queued.retry_count,
                error: error.to_string(),
                failed_at: Utc::now().to_rfc3339(),
            },
        }
    }

    /// Builds the record for an unroutable queued row
    pub fn for_unroutable(url: &str, reason: &str) -> Self {
        Self {
            diagnostics: FailureDiagnostics {
                url: url.to_string(),
                stage: "unknown".to_string(),
                retry_count: 0,
                error: reason.to_string(),
                failed_at: Utc::now().to_rfc3339(),
            },
        }
    }
}

/// A record bound for the sink
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SinkRecord {
    Offer(OfferRecord),
    Failure(DebugRecord),
}
