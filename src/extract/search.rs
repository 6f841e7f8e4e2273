//! Search-results extraction
//!
//! Walks every product container on a search page and reads the product
//! identifier, the title, and the canonical detail-page URL.

use crate::extract::selectors::{compile, SelectorConfig};
use crate::extract::{ExtractError, ExtractResult, Extractor, SearchHit};
use crate::pipeline::RenderedPage;
use scraper::Selector;

/// CSS-driven search extractor
pub struct CssSearchExtractor {
    result_item: Selector,
    title_link: Selector,
    title_link_source: String,
    asin_attribute: String,
}

impl CssSearchExtractor {
    /// Compiles the search selectors from configuration
    pub fn from_config(selectors: &SelectorConfig) -> ExtractResult<Self> {
        Ok(Self {
            result_item: compile(&selectors.result_item)?,
            title_link: compile(&selectors.title_link)?,
            title_link_source: selectors.title_link.clone(),
            asin_attribute: selectors.asin_attribute.clone(),
        })
    }
}

impl Extractor for CssSearchExtractor {
    type Output = Vec<SearchHit>;

    fn extract(&self, page: &RenderedPage) -> ExtractResult<Vec<SearchHit>> {
        let mut hits = Vec::new();

        for container in page.select(&self.result_item) {
            // Containers without an identifier are ad slots or placeholders
            let asin = match container.value().attr(&self.asin_attribute) {
                Some(value) if !value.trim().is_empty() => value.trim().to_string(),
                _ => continue,
            };

            // A container holds several anchors to the same detail page
            // (image, badges); only the title anchor carries the title text.
            let anchor = container
                .select(&self.title_link)
                .next()
                .ok_or_else(|| ExtractError::MissingElement(self.title_link_source.clone()))?;

            let href = anchor
                .value()
                .attr("href")
                .ok_or_else(|| ExtractError::MissingAttribute {
                    selector: self.title_link_source.clone(),
                    attr: "href".to_string(),
                })?;

            let url = page
                .resolve(href)
                .ok_or_else(|| ExtractError::BadUrl(href.to_string()))?;

            let title = anchor.text().collect::<String>().trim().to_string();

            hits.push(SearchHit { asin, title, url });
        }

        Ok(hits)
    }
}
