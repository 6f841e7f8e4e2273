//! Seller-offer extraction
//!
//! Reads one row per offer: seller name, price text, and shipping text.
//! Empty or absent shipping text substitutes the literal `"free"`.

use crate::extract::selectors::{compile, SelectorConfig};
use crate::extract::{ExtractError, ExtractResult, Extractor, OfferRow, FREE_SHIPPING};
use crate::pipeline::RenderedPage;
use scraper::{ElementRef, Selector};

/// CSS-driven offer extractor
pub struct CssOfferExtractor {
    offer_row: Selector,
    offer_seller: Selector,
    offer_seller_source: String,
    offer_price: Selector,
    offer_price_source: String,
    offer_shipping: Selector,
}

impl CssOfferExtractor {
    pub fn from_config(selectors: &SelectorConfig) -> ExtractResult<Self> {
        Ok(Self {
            offer_row: compile(&selectors.offer_row)?,
            offer_seller: compile(&selectors.offer_seller)?,
            offer_seller_source: selectors.offer_seller.clone(),
            offer_price: compile(&selectors.offer_price)?,
            offer_price_source: selectors.offer_price.clone(),
            offer_shipping: compile(&selectors.offer_shipping)?,
        })
    }

    fn required_text(
        &self,
        row: ElementRef<'_>,
        selector: &Selector,
        source: &str,
    ) -> ExtractResult<String> {
        row.select(selector)
            .next()
            .map(|element| element.text().collect::<String>().trim().to_string())
            .ok_or_else(|| ExtractError::MissingElement(source.to_string()))
    }
}

impl Extractor for CssOfferExtractor {
    type Output = Vec<OfferRow>;

    fn extract(&self, page: &RenderedPage) -> ExtractResult<Vec<OfferRow>> {
        let mut rows = Vec::new();

        for row in page.select(&self.offer_row) {
            let seller = self.required_text(row, &self.offer_seller, &self.offer_seller_source)?;
            let price = self.required_text(row, &self.offer_price, &self.offer_price_source)?;

            let shipping = row
                .select(&self.offer_shipping)
                .next()
                .map(|element| element.text().collect::<String>().trim().to_string())
                .unwrap_or_default();
            let shipping = if shipping.is_empty() {
                FREE_SHIPPING.to_string()
            } else {
                shipping
            };

            rows.push(OfferRow {
                seller,
                price,
                shipping,
            });
        }

        Ok(rows)
    }
}
