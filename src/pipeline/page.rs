//! Rendered-page handle consumed by the extractors
//!
//! Wraps a parsed HTML document together with the URL it was fetched from,
//! exposing just the element queries the extraction stages need.

use scraper::{ElementRef, Html, Selector};
use url::Url;

/// A fetched page, parsed and ready for extraction
pub struct RenderedPage {
    url: Url,
    document: Html,
}

impl RenderedPage {
    /// Parses a page body fetched from the given URL
    pub fn new(url: Url, html: &str) -> Self {
        Self {
            url,
            document: Html::parse_document(html),
        }
    }

    /// The URL this page was rendered from (after redirects)
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// All elements matching the selector, in document order
    pub fn select<'a, 'b>(&'a self, selector: &'b Selector) -> scraper::html::Select<'a, 'b> {
        self.document.select(selector)
    }

    /// The first element matching the selector, if any
    pub fn select_first(&self, selector: &Selector) -> Option<ElementRef<'_>> {
        self.document.select(selector).next()
    }

    /// Resolves an href against the page URL
    ///
    /// Returns None for empty hrefs and anything that doesn't resolve to an
    /// http(s) URL.
    pub fn resolve(&self, href: &str) -> Option<Url> {
        let href = href.trim();
        if href.is_empty() {
            return None;
        }

        match self.url.join(href) {
            Ok(absolute) if absolute.scheme() == "http" || absolute.scheme() == "https" => {
                Some(absolute)
            }
            _ => None,
        }
    }
}
