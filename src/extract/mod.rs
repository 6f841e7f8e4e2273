//! Extraction strategies, one per pipeline stage
//!
//! Each extractor is a pure function from a rendered page to structured
//! data. Selectors come from configuration, so selector drift on the target
//! site is fixed by editing the config (or swapping a strategy), never by
//! touching the controller.

mod description;
mod offers;
mod search;
mod selectors;

pub use description::CssDescriptionExtractor;
pub use offers::CssOfferExtractor;
pub use search::CssSearchExtractor;
pub use selectors::SelectorConfig;

use crate::pipeline::RenderedPage;
use thiserror::Error;
use url::Url;

/// Errors that can occur during page extraction
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    #[error("Required element not found: {0}")]
    MissingElement(String),

    #[error("Element matching '{selector}' is missing attribute '{attr}'")]
    MissingAttribute { selector: String, attr: String },

    #[error("Could not resolve URL '{0}'")]
    BadUrl(String),
}

/// Result type for extraction operations
pub type ExtractResult<T> = Result<T, ExtractError>;

/// A stage extraction strategy: turns a rendered page into structured data
///
/// Implementations hold their compiled selectors and nothing else; they are
/// safe to share across concurrent dispatches.
pub trait Extractor: Send + Sync {
    type Output;

    fn extract(&self, page: &RenderedPage) -> ExtractResult<Self::Output>;
}

/// One entry of a search-results page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    /// Unique product identifier read from the container attribute
    pub asin: String,

    /// Product title text from the title anchor
    pub title: String,

    /// Canonical detail-page URL, resolved against the page URL
    pub url: Url,
}

/// One row of a seller-offer listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferRow {
    pub seller: String,
    pub price: String,
    pub shipping: String,
}

/// Shipping value substituted when an offer row has empty shipping text
pub const FREE_SHIPPING: &str = "free";
