//! Pipeline controller: the stage-dispatch state machine
//!
//! The controller is a pure transition function. Given a stage label, a
//! rendered page, and the payload accumulated so far, it runs the stage's
//! extractor and produces the effect of that dispatch: the next work items
//! to enqueue, or the terminal records to emit. It performs no I/O and
//! holds no mutable state, so it is safe to invoke concurrently and easy to
//! test against a fake page.
//!
//! ```text
//! SearchKeyword --(N hits)--> ExtractDescription --(1 item)--> ExtractOffers --(M rows)--> emit
//! ```

use crate::config::Config;
use crate::extract::{
    CssDescriptionExtractor, CssOfferExtractor, CssSearchExtractor, ExtractError, Extractor,
    OfferRow, SearchHit,
};
use crate::output::OfferRecord;
use crate::pipeline::page::RenderedPage;
use crate::queue::WorkItem;
use crate::site;
use crate::state::{keys, Payload, Stage};
use serde_json::Value;
use thiserror::Error;
use url::Url;

/// Errors produced while dispatching one work item
#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error("Payload is missing required key '{0}'")]
    MissingPayloadKey(&'static str),

    #[error("Failed to build URL for next stage: {0}")]
    NextUrl(#[from] url::ParseError),
}

/// The effect of dispatching one work item
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Fan out: one new work item per extracted search hit
    EnqueueMany(Vec<WorkItem>),

    /// Advance a single product to its offer listing
    EnqueueOne(WorkItem),

    /// Terminal: fully accumulated offer records for the sink
    Emit(Vec<OfferRecord>),
}

type SearchStrategy = Box<dyn Extractor<Output = Vec<SearchHit>>>;
type DescriptionStrategy = Box<dyn Extractor<Output = Option<String>>>;
type OfferStrategy = Box<dyn Extractor<Output = Vec<OfferRow>>>;

/// The stage-dispatch state machine
pub struct Controller {
    base_url: Url,
    search: SearchStrategy,
    description: DescriptionStrategy,
    offers: OfferStrategy,
}

impl Controller {
    /// Assembles a controller from explicit strategies
    ///
    /// Strategies are injected here so selector drift is fixed by swapping
    /// an extractor, never by editing the state machine.
    pub fn new(
        base_url: Url,
        search: SearchStrategy,
        description: DescriptionStrategy,
        offers: OfferStrategy,
    ) -> Self {
        Self {
            base_url,
            search,
            description,
            offers,
        }
    }

    /// Builds a controller with the CSS strategies from configuration
    pub fn from_config(config: &Config) -> crate::Result<Self> {
        let base_url = Url::parse(&config.site.base_url)?;
        let selectors = &config.site.selectors;

        Ok(Self::new(
            base_url,
            Box::new(CssSearchExtractor::from_config(selectors)?),
            Box::new(CssDescriptionExtractor::from_config(selectors)?),
            Box::new(CssOfferExtractor::from_config(selectors)?),
        ))
    }

    /// The initial work item seeding the queue
    ///
    /// Its payload contains exactly the keyword.
    pub fn seed_item(&self, keyword: &str) -> Result<WorkItem, url::ParseError> {
        let url = site::search_url(&self.base_url, keyword)?;
        Ok(WorkItem::new(
            url,
            Stage::SearchKeyword,
            Payload::seed(keyword),
        ))
    }

    /// Runs one stage against a rendered page
    ///
    /// The payload is read-only; new work items carry copies extended with
    /// this stage's fields. Extraction failures propagate to the caller,
    /// whose retry budget owns the failure decision.
    pub fn dispatch(
        &self,
        stage: Stage,
        page: &RenderedPage,
        payload: &Payload,
    ) -> Result<Effect, StageError> {
        match stage {
            Stage::SearchKeyword => {
                let hits = self.search.extract(page)?;
                let items = hits
                    .into_iter()
                    .map(|hit| {
                        let SearchHit { asin, title, url } = hit;
                        let next = payload.merged(vec![
                            (keys::ASIN, Value::String(asin)),
                            (keys::ITEM_URL, Value::String(url.to_string())),
                            (keys::TITLE, Value::String(title)),
                        ]);
                        WorkItem::new(url, Stage::ExtractDescription, next)
                    })
                    .collect();
                Ok(Effect::EnqueueMany(items))
            }

            Stage::ExtractDescription => {
                let description = self.description.extract(page)?;
                let asin = payload
                    .asin()
                    .ok_or(StageError::MissingPayloadKey(keys::ASIN))?;
                let url = site::offers_url(&self.base_url, asin)?;

                // A listing without a description stays in the record as an
                // explicit null, not a dropped field.
                let next = payload.merged(vec![(
                    keys::DESCRIPTION,
                    description.map(Value::String).unwrap_or(Value::Null),
                )]);
                Ok(Effect::EnqueueOne(WorkItem::new(
                    url,
                    Stage::ExtractOffers,
                    next,
                )))
            }

            Stage::ExtractOffers => {
                let rows = self.offers.extract(page)?;
                let keyword = payload
                    .keyword()
                    .ok_or(StageError::MissingPayloadKey(keys::KEYWORD))?;
                let item_url = payload
                    .item_url()
                    .ok_or(StageError::MissingPayloadKey(keys::ITEM_URL))?;

                let records = rows
                    .into_iter()
                    .map(|row| OfferRecord {
                        seller: row.seller,
                        price: row.price,
                        shipping: row.shipping,
                        description: payload.description().map(str::to_string),
                        title: payload.title().map(str::to_string),
                        item_url: item_url.to_string(),
                        keyword: keyword.to_string(),
                    })
                    .collect();
                Ok(Effect::Emit(records))
            }
        }
    }
}
