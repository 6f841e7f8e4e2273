/// Stage definitions for the crawl pipeline
///
/// Each queued work item carries a stage label that selects which extractor
/// runs against its rendered page and what the next transition is.
use std::fmt;

/// One step of the crawl pipeline.
///
/// The pipeline advances `SearchKeyword -> ExtractDescription ->
/// ExtractOffers`; the offers stage is terminal and emits records instead of
/// enqueueing further work. Because this is a closed enum, dispatch over it
/// is exhaustive and an unroutable label can only enter the system through a
/// corrupted queue row (which the queue reports as an error rather than
/// dropping).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Search-results page: fans out one item per product found
    SearchKeyword,

    /// Product detail page: captures the description, advances one item
    ExtractDescription,

    /// Seller-offer listing: terminal, emits one record per offer row
    ExtractOffers,
}

impl Stage {
    /// Converts the stage to its queue label representation
    pub fn as_label(&self) -> &'static str {
        match self {
            Self::SearchKeyword => "search_keyword",
            Self::ExtractDescription => "extract_description",
            Self::ExtractOffers => "extract_offers",
        }
    }

    /// Parses a stage from its queue label representation
    ///
    /// Returns None if the label doesn't match any known stage.
    pub fn from_label(s: &str) -> Option<Self> {
        match s {
            "search_keyword" => Some(Self::SearchKeyword),
            "extract_description" => Some(Self::ExtractDescription),
            "extract_offers" => Some(Self::ExtractOffers),
            _ => None,
        }
    }

    /// Returns all pipeline stages in crawl order
    pub fn all_stages() -> Vec<Self> {
        vec![
            Self::SearchKeyword,
            Self::ExtractDescription,
            Self::ExtractOffers,
        ]
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_label() {
        assert_eq!(Stage::SearchKeyword.as_label(), "search_keyword");
        assert_eq!(Stage::ExtractDescription.as_label(), "extract_description");
        assert_eq!(Stage::ExtractOffers.as_label(), "extract_offers");
    }

    #[test]
    fn test_from_label() {
        assert_eq!(
            Stage::from_label("search_keyword"),
            Some(Stage::SearchKeyword)
        );
        assert_eq!(
            Stage::from_label("extract_description"),
            Some(Stage::ExtractDescription)
        );
        assert_eq!(
            Stage::from_label("extract_offers"),
            Some(Stage::ExtractOffers)
        );
        assert_eq!(Stage::from_label("write_out"), None);
        assert_eq!(Stage::from_label(""), None);
    }

    #[test]
    fn test_roundtrip_label() {
        for stage in Stage::all_stages() {
            let label = stage.as_label();
            let parsed = Stage::from_label(label);
            assert_eq!(Some(stage), parsed, "Failed roundtrip for {:?}", stage);
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Stage::SearchKeyword), "search_keyword");
        assert_eq!(format!("{}", Stage::ExtractOffers), "extract_offers");
    }
}
