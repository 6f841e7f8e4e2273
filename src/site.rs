//! URL construction for the crawl stages
//!
//! The pipeline only ever visits three kinds of page: the keyword search,
//! product detail pages (whose URLs come from search results), and the
//! offer listing for a product identifier.

use url::Url;

/// Builds the search-results URL for a keyword
pub fn search_url(base: &Url, keyword: &str) -> Result<Url, url::ParseError> {
    let mut url = base.join("/s")?;
    url.query_pairs_mut().append_pair("k", keyword);
    Ok(url)
}

/// Builds the offer-listing URL for a product identifier
pub fn offers_url(base: &Url, asin: &str) -> Result<Url, url::ParseError> {
    base.join(&format!("/gp/offer-listing/{}", asin))
}
