//! Product-description extraction
//!
//! Some listings omit the description container entirely; that is not a
//! failure. The absent case flows through the pipeline as an explicit null.

use crate::extract::selectors::{compile, SelectorConfig};
use crate::extract::{ExtractResult, Extractor};
use crate::pipeline::RenderedPage;
use scraper::Selector;

/// CSS-driven description extractor
pub struct CssDescriptionExtractor {
    description: Selector,
}

impl CssDescriptionExtractor {
    pub fn from_config(selectors: &SelectorConfig) -> ExtractResult<Self> {
        Ok(Self {
            description: compile(&selectors.description)?,
        })
    }
}

impl Extractor for CssDescriptionExtractor {
    type Output = Option<String>;

    fn extract(&self, page: &RenderedPage) -> ExtractResult<Option<String>> {
        Ok(page
            .select_first(&self.description)
            .map(|element| element.text().collect::<String>().trim().to_string()))
    }
}
