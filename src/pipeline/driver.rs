//! Crawl driver: pops work, renders pages, applies controller effects
//!
//! This is the orchestration loop around the pure controller:
//! - Seeds the queue with the initial search item
//! - Pops work items and dispatches them concurrently (semaphore-bounded)
//! - Applies effects: durable enqueues for next stages, sink pushes for
//!   terminal records
//! - Owns the retry budget: failed attempts go back to the queue until the
//!   budget is exhausted, then convert to a failure record
//! - Enforces the total request budget; in-flight dispatches complete, no
//!   forced cancellation

use crate::config::Config;
use crate::output::{CrawlStats, DebugRecord, JsonlSink, Sink, SinkRecord};
use crate::pipeline::controller::{Controller, Effect};
use crate::pipeline::fetcher::{build_http_client, fetch_page, FetchOutcome};
use crate::pipeline::page::RenderedPage;
use crate::queue::{QueueError, QueuedItem, RunStatus, SqliteQueue, WorkQueue};
use crate::Result;
use reqwest::Client;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Main crawl driver structure
pub struct Driver {
    config: Arc<Config>,
    controller: Arc<Controller>,
    client: Client,
    queue: Arc<Mutex<SqliteQueue>>,
    sink: Arc<dyn Sink>,
    run_id: i64,
}

impl Driver {
    /// Creates a driver writing to the configured JSON-lines dataset
    ///
    /// # Arguments
    ///
    /// * `config` - The validated crawler configuration
    /// * `fresh` - Whether to start a fresh crawl (clears queued work)
    /// * `config_hash` - Hash of the configuration file, recorded with the run
    pub fn new(config: Config, fresh: bool, config_hash: &str) -> Result<Self> {
        let sink = Arc::new(JsonlSink::create(Path::new(&config.output.dataset_path))?);
        Self::with_sink(config, fresh, config_hash, sink)
    }

    /// Wires a driver with an explicit sink (tests use an in-memory one)
    pub fn with_sink(
        config: Config,
        fresh: bool,
        config_hash: &str,
        sink: Arc<dyn Sink>,
    ) -> Result<Self> {
        let controller = Controller::from_config(&config)?;
        let client = build_http_client(&config.http)?;

        let mut queue = SqliteQueue::new(Path::new(&config.output.queue_path))?;
        let run_id = if fresh {
            queue.clear()?;
            queue.create_run(&config.search.keyword, config_hash)?
        } else if let Some(run) = queue.latest_run()? {
            if run.status == RunStatus::Running {
                tracing::info!("Resuming interrupted run {}", run.id);
                let reset = queue.reset_in_flight()?;
                if reset > 0 {
                    tracing::info!("Returned {} in-flight items to the queue", reset);
                }
                run.id
            } else {
                tracing::info!("Starting new run");
                queue.create_run(&config.search.keyword, config_hash)?
            }
        } else {
            tracing::info!("No previous runs found, starting new run");
            queue.create_run(&config.search.keyword, config_hash)?
        };

        Ok(Self {
            config: Arc::new(config),
            controller: Arc::new(controller),
            client,
            queue: Arc::new(Mutex::new(queue)),
            sink,
            run_id,
        })
    }

    /// Runs the crawl to queue exhaustion or budget cap
    pub async fn run(&mut self) -> Result<CrawlStats> {
        tracing::info!(
            "Starting crawl run {} for keyword '{}'",
            self.run_id,
            self.config.search.keyword
        );
        let start_time = std::time::Instant::now();

        self.seed_if_empty()?;

        let budget = self.config.crawler.max_requests_per_crawl;
        let max_retries = self.config.crawler.max_request_retries;
        let semaphore = Arc::new(Semaphore::new(
            self.config.crawler.max_concurrent_pages as usize,
        ));
        let mut tasks: JoinSet<ItemOutcome> = JoinSet::new();
        let mut stats = CrawlStats::default();

        loop {
            if stats.requests_handled >= budget {
                tracing::info!("Request budget of {} reached", budget);
                break;
            }

            let popped = { self.queue.lock().unwrap().pop() };
            let queued = match popped {
                Ok(Some(queued)) => queued,
                Ok(None) => {
                    if tasks.is_empty() {
                        tracing::info!("Queue drained, crawl complete");
                        break;
                    }
                    // In-flight work may still fan out; wait for one task
                    // before checking the queue again.
                    if let Some(joined) = tasks.join_next().await {
                        absorb(&mut stats, joined);
                    }
                    continue;
                }
                Err(QueueError::CorruptItem { id, url, reason }) => {
                    tracing::error!("Dropping unroutable item {} ({}): {}", id, url, reason);
                    let record = DebugRecord::for_unroutable(&url, &reason);
                    if let Err(e) = self.sink.push(&SinkRecord::Failure(record)) {
                        tracing::error!("Failed to record unroutable item: {}", e);
                    }
                    stats.failures += 1;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            stats.requests_handled += 1;
            stats.record_stage(queued.item.stage);
            tracing::debug!(
                "Processing {} item: {}",
                queued.item.stage,
                queued.item.url
            );

            let Ok(permit) = semaphore.clone().acquire_owned().await else {
                break;
            };
            let client = self.client.clone();
            let controller = Arc::clone(&self.controller);
            let queue = Arc::clone(&self.queue);
            let sink = Arc::clone(&self.sink);
            tasks.spawn(async move {
                let outcome =
                    process_item(client, controller, queue, sink, max_retries, queued).await;
                drop(permit);
                outcome
            });
        }

        // Budget reached or queue drained: let in-flight dispatches finish
        while let Some(joined) = tasks.join_next().await {
            absorb(&mut stats, joined);
        }

        self.sink.finalize()?;
        {
            let mut queue = self.queue.lock().unwrap();
            queue.complete_run(self.run_id)?;
        }

        tracing::info!(
            "Crawl completed: {} requests handled, {} offers emitted in {:?}",
            stats.requests_handled,
            stats.offers_emitted,
            start_time.elapsed()
        );

        Ok(stats)
    }

    /// Seeds the queue with the initial search item when nothing is pending
    fn seed_if_empty(&self) -> Result<()> {
        let mut queue = self.queue.lock().unwrap();
        if queue.pending_count()? > 0 {
            return Ok(());
        }

        let seed = self.controller.seed_item(&self.config.search.keyword)?;
        if queue.enqueue(&seed)? {
            tracing::info!(
                "Seeded queue with search for '{}'",
                self.config.search.keyword
            );
        }
        Ok(())
    }
}

/// What happened to one dispatched work item
#[derive(Debug)]
enum ItemOutcome {
    Completed {
        enqueued: u64,
        duplicates: u64,
        emitted: u64,
    },
    Retried,
    Exhausted,
    Infra(String),
}

/// Folds a finished task into the run counters
fn absorb(stats: &mut CrawlStats, joined: std::result::Result<ItemOutcome, tokio::task::JoinError>) {
    match joined {
        Ok(ItemOutcome::Completed {
            enqueued,
            duplicates,
            emitted,
        }) => {
            stats.items_enqueued += enqueued;
            stats.duplicates_skipped += duplicates;
            stats.offers_emitted += emitted;
        }
        Ok(ItemOutcome::Retried) => stats.retries += 1,
        Ok(ItemOutcome::Exhausted) => stats.failures += 1,
        Ok(ItemOutcome::Infra(message)) => {
            tracing::error!("Infrastructure error while processing item: {}", message);
            stats.failures += 1;
        }
        Err(e) => {
            tracing::error!("Dispatch task failed: {}", e);
            stats.failures += 1;
        }
    }
}

/// Failure modes of a single dispatch attempt
enum AttemptError {
    /// The page could not be fetched or extracted; eligible for retry
    Page(String),

    /// Queue or sink trouble; not the page's fault, so no retry
    Infra(String),
}

struct AppliedEffect {
    enqueued: u64,
    duplicates: u64,
    emitted: u64,
}

/// Dispatches one popped item and settles it in the queue
async fn process_item(
    client: Client,
    controller: Arc<Controller>,
    queue: Arc<Mutex<SqliteQueue>>,
    sink: Arc<dyn Sink>,
    max_retries: u32,
    queued: QueuedItem,
) -> ItemOutcome {
    let url = queued.item.url.clone();

    match attempt(&client, &controller, &queue, &sink, &queued).await {
        Ok(applied) => {
            if let Err(e) = queue.lock().unwrap().mark_done(queued.id) {
                return ItemOutcome::Infra(e.to_string());
            }
            ItemOutcome::Completed {
                enqueued: applied.enqueued,
                duplicates: applied.duplicates,
                emitted: applied.emitted,
            }
        }

        Err(AttemptError::Infra(message)) => ItemOutcome::Infra(message),

        Err(AttemptError::Page(error)) => {
            tracing::warn!("Stage {} failed for {}: {}", queued.item.stage, url, error);

            if queued.retry_count < max_retries {
                match queue.lock().unwrap().requeue(queued.id) {
                    Ok(count) => {
                        tracing::debug!("Requeued {} for attempt {}", url, count + 1);
                        ItemOutcome::Retried
                    }
                    Err(e) => ItemOutcome::Infra(e.to_string()),
                }
            } else {
                tracing::error!(
                    "Giving up on {} after {} attempts: {}",
                    url,
                    queued.retry_count + 1,
                    error
                );
                if let Err(e) = queue.lock().unwrap().mark_failed(queued.id) {
                    return ItemOutcome::Infra(e.to_string());
                }
                let record = DebugRecord::for_exhausted(&queued, &error);
                if let Err(e) = sink.push(&SinkRecord::Failure(record)) {
                    return ItemOutcome::Infra(e.to_string());
                }
                ItemOutcome::Exhausted
            }
        }
    }
}

/// Fetches, dispatches, and applies the effect of one work item
async fn attempt(
    client: &Client,
    controller: &Controller,
    queue: &Mutex<SqliteQueue>,
    sink: &Arc<dyn Sink>,
    queued: &QueuedItem,
) -> std::result::Result<AppliedEffect, AttemptError> {
    let item = &queued.item;

    let (final_url, body) = match fetch_page(client, &item.url).await {
        FetchOutcome::Success {
            final_url, body, ..
        } => (final_url, body),
        FetchOutcome::HttpError { status_code } => {
            return Err(AttemptError::Page(format!("HTTP {}", status_code)));
        }
        FetchOutcome::NetworkError { error } => {
            return Err(AttemptError::Page(error));
        }
        FetchOutcome::ContentMismatch { content_type } => {
            return Err(AttemptError::Page(format!(
                "Expected HTML, got {}",
                content_type
            )));
        }
    };

    // The parsed document never crosses an await: dispatch is synchronous
    // and the page is dropped before the effect is applied.
    let effect = {
        let page = RenderedPage::new(final_url, &body);
        controller
            .dispatch(item.stage, &page, &item.payload)
            .map_err(|e| AttemptError::Page(e.to_string()))?
    };

    apply_effect(effect, queue, sink)
}

/// Applies a dispatch effect
///
/// Next-stage enqueues are durable before this returns, so queue read-ahead
/// can never race an unconfirmed enqueue.
fn apply_effect(
    effect: Effect,
    queue: &Mutex<SqliteQueue>,
    sink: &Arc<dyn Sink>,
) -> std::result::Result<AppliedEffect, AttemptError> {
    let mut applied = AppliedEffect {
        enqueued: 0,
        duplicates: 0,
        emitted: 0,
    };

    match effect {
        Effect::EnqueueMany(items) => {
            let mut queue = queue.lock().unwrap();
            for item in &items {
                if queue
                    .enqueue(item)
                    .map_err(|e| AttemptError::Infra(e.to_string()))?
                {
                    applied.enqueued += 1;
                } else {
                    applied.duplicates += 1;
                }
            }
        }

        Effect::EnqueueOne(item) => {
            let inserted = queue
                .lock()
                .unwrap()
                .enqueue(&item)
                .map_err(|e| AttemptError::Infra(e.to_string()))?;
            if inserted {
                applied.enqueued += 1;
            } else {
                applied.duplicates += 1;
            }
        }

        Effect::Emit(records) => {
            for record in records {
                sink.push(&SinkRecord::Offer(record))
                    .map_err(|e| AttemptError::Infra(e.to_string()))?;
                applied.emitted += 1;
            }
        }
    }

    Ok(applied)
}

/// Runs a complete crawl with the configured stack
///
/// # Arguments
///
/// * `config` - The validated crawler configuration
/// * `fresh` - Whether to start fresh instead of resuming queued work
/// * `config_hash` - Hash of the configuration file
pub async fn crawl(config: Config, fresh: bool, config_hash: &str) -> Result<CrawlStats> {
    let mut driver = Driver::new(config, fresh, config_hash)?;
    driver.run().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absorb_accumulates_counters() {
        let mut stats = CrawlStats::default();

        absorb(
            &mut stats,
            Ok(ItemOutcome::Completed {
                enqueued: 3,
                duplicates: 1,
                emitted: 0,
            }),
        );
        absorb(&mut stats, Ok(ItemOutcome::Retried));
        absorb(&mut stats, Ok(ItemOutcome::Exhausted));
        absorb(&mut stats, Ok(ItemOutcome::Infra("oops".to_string())));

        assert_eq!(stats.items_enqueued, 3);
        assert_eq!(stats.duplicates_skipped, 1);
        assert_eq!(stats.retries, 1);
        assert_eq!(stats.failures, 2);
    }
}
