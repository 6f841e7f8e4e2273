//! In-memory sink for tests

use crate::output::traits::{OutputResult, Sink};
use crate::output::{DebugRecord, OfferRecord, SinkRecord};
use std::sync::Mutex;

/// Collects records in memory so tests can assert on them
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<SinkRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything pushed so far
    pub fn records(&self) -> Vec<SinkRecord> {
        self.records.lock().unwrap().clone()
    }

    /// Just the offer records
    pub fn offers(&self) -> Vec<OfferRecord> {
        self.records()
            .into_iter()
            .filter_map(|record| match record {
                SinkRecord::Offer(offer) => Some(offer),
                SinkRecord::Failure(_) => None,
            })
            .collect()
    }

    /// Just the failure records
    pub fn failures(&self) -> Vec<DebugRecord> {
        self.records()
            .into_iter()
            .filter_map(|record| match record {
                SinkRecord::Failure(failure) => Some(failure),
                SinkRecord::Offer(_) => None,
            })
            .collect()
    }
}

impl Sink for MemorySink {
    fn push(&self, record: &SinkRecord) -> OutputResult<()> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}
