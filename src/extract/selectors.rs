//! Selector configuration for the stage extractors
//!
//! Defaults target the reference site's markup; every selector can be
//! overridden under `[site.selectors]` in the config file.

use crate::extract::{ExtractError, ExtractResult};
use scraper::Selector;
use serde::Deserialize;

/// CSS selectors driving the three extraction stages
#[derive(Debug, Clone, Deserialize)]
pub struct SelectorConfig {
    /// Search: product container carrying the identifier attribute
    #[serde(rename = "result-item", default = "default_result_item")]
    pub result_item: String,

    /// Search: attribute on the container holding the product identifier
    #[serde(rename = "asin-attribute", default = "default_asin_attribute")]
    pub asin_attribute: String,

    /// Search: the title anchor inside a container. Containers legitimately
    /// hold several anchors to the same detail page; this must match the
    /// title one.
    #[serde(rename = "title-link", default = "default_title_link")]
    pub title_link: String,

    /// Description: the description container on a detail page
    #[serde(rename = "description", default = "default_description")]
    pub description: String,

    /// Offers: one element per offer row
    #[serde(rename = "offer-row", default = "default_offer_row")]
    pub offer_row: String,

    /// Offers: seller name within a row
    #[serde(rename = "offer-seller", default = "default_offer_seller")]
    pub offer_seller: String,

    /// Offers: price text within a row
    #[serde(rename = "offer-price", default = "default_offer_price")]
    pub offer_price: String,

    /// Offers: shipping text within a row; empty or absent means free
    #[serde(rename = "offer-shipping", default = "default_offer_shipping")]
    pub offer_shipping: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            result_item: default_result_item(),
            asin_attribute: default_asin_attribute(),
            title_link: default_title_link(),
            description: default_description(),
            offer_row: default_offer_row(),
            offer_seller: default_offer_seller(),
            offer_price: default_offer_price(),
            offer_shipping: default_offer_shipping(),
        }
    }
}

fn default_result_item() -> String {
    "div.s-result-item[data-asin]".to_string()
}

fn default_asin_attribute() -> String {
    "data-asin".to_string()
}

fn default_title_link() -> String {
    "h2 a".to_string()
}

fn default_description() -> String {
    "#productDescription".to_string()
}

fn default_offer_row() -> String {
    "#aod-offer".to_string()
}

fn default_offer_seller() -> String {
    "#aod-offer-soldBy a".to_string()
}

fn default_offer_price() -> String {
    ".a-price .a-offscreen".to_string()
}

fn default_offer_shipping() -> String {
    "#aod-offer-shippingCharge".to_string()
}

impl SelectorConfig {
    /// Checks that every selector compiles and the attribute name is set
    ///
    /// Used during config validation to fail fast before any queue work.
    pub fn check(&self) -> ExtractResult<()> {
        compile(&self.result_item)?;
        compile(&self.title_link)?;
        compile(&self.description)?;
        compile(&self.offer_row)?;
        compile(&self.offer_seller)?;
        compile(&self.offer_price)?;
        compile(&self.offer_shipping)?;

        if self.asin_attribute.trim().is_empty() {
            return Err(ExtractError::MissingAttribute {
                selector: self.result_item.clone(),
                attr: "asin-attribute".to_string(),
            });
        }

        Ok(())
    }
}

/// Compiles a CSS selector string, attaching the source text to errors
pub(crate) fn compile(selector: &str) -> ExtractResult<Selector> {
    Selector::parse(selector).map_err(|e| ExtractError::Selector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_compile() {
        let config = SelectorConfig::default();
        assert!(config.check().is_ok());
    }

    #[test]
    fn test_invalid_selector_rejected() {
        let config = SelectorConfig {
            result_item: ":::".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.check(),
            Err(ExtractError::Selector { .. })
        ));
    }

    #[test]
    fn test_empty_attribute_rejected() {
        let config = SelectorConfig {
            asin_attribute: "  ".to_string(),
            ..Default::default()
        };
        assert!(config.check().is_err());
    }

    #[test]
    fn test_compile_reports_source_selector() {
        let err = compile("div[").unwrap_err();
        match err {
            ExtractError::Selector { selector, .. } => assert_eq!(selector, "div["),
            other => panic!("Unexpected error: {:?}", other),
        }
    }
}
