//! Offerhound: a product-offer crawl pipeline
//!
//! This crate implements a three-stage crawl over an e-commerce site
//! (search results, then product description, then seller offers) as a
//! stage-dispatch state machine layered on a persistent work queue, with
//! retry-based failure handling and a hard crawl budget.

pub mod config;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod queue;
pub mod site;
pub mod state;

use thiserror::Error;

/// Main error type for offerhound operations
#[derive(Debug, Error)]
pub enum HoundError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Queue error: {0}")]
    Queue(#[from] queue::QueueError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Extraction error: {0}")]
    Extract(#[from] extract::ExtractError),

    #[error("Stage dispatch error: {0}")]
    Stage(#[from] pipeline::StageError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid selector in config: {0}")]
    InvalidSelector(String),
}

/// Result type alias for offerhound operations
pub type Result<T> = std::result::Result<T, HoundError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use pipeline::{crawl, Controller, Effect};
pub use queue::WorkItem;
pub use state::{Payload, Stage};
