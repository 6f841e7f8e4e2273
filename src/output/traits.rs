//! Sink trait and error types

use crate::output::SinkRecord;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write record: {0}")]
    Write(String),

    #[error("Failed to serialize record: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Receives terminal records from the pipeline
///
/// Called once per offer record and once per failure record. Sinks must be
/// safe to call from concurrent dispatch tasks.
pub trait Sink: Send + Sync {
    /// Persists one record
    fn push(&self, record: &SinkRecord) -> OutputResult<()>;

    /// Flushes buffered output at the end of a run
    fn finalize(&self) -> OutputResult<()> {
        Ok(())
    }
}
