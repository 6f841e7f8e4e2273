//! Integration tests for the offer crawl pipeline
//!
//! These tests use wiremock to serve fake search, detail, and offer pages
//! and exercise the full three-stage crawl end-to-end.

use offerhound::config::{
    Config, CrawlerConfig, HttpConfig, OutputConfig, SearchConfig, SiteConfig,
};
use offerhound::output::{CrawlStats, MemorySink, Sink};
use offerhound::pipeline::Driver;
use offerhound::queue::{SqliteQueue, WorkQueue};
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointed at the mock server
fn create_test_config(base_url: &str, keyword: &str, dir: &TempDir) -> Config {
    Config {
        search: SearchConfig {
            keyword: keyword.to_string(),
        },
        crawler: CrawlerConfig {
            max_requests_per_crawl: 100,
            max_request_retries: 2,
            max_concurrent_pages: 3,
        },
        http: HttpConfig::default(),
        site: SiteConfig {
            base_url: base_url.to_string(),
            selectors: Default::default(),
        },
        output: OutputConfig {
            queue_path: dir.path().join("queue.db").to_string_lossy().into_owned(),
            dataset_path: dir
                .path()
                .join("offers.jsonl")
                .to_string_lossy()
                .into_owned(),
        },
    }
}

fn html_response(body: String) -> ResponseTemplate {
    // `set_body_raw` sets the mime directly; `set_body_string` would force a
    // `text/plain` mime that overrides any `content-type` header inserted
    // afterwards, so the page would not be recognized as HTML.
    ResponseTemplate::new(200).set_body_raw(
        format!("<html><body>{}</body></html>", body).into_bytes(),
        "text/html",
    )
}

fn result_item(asin: &str, title: &str) -> String {
    format!(
        r#"<div class="s-result-item" data-asin="{asin}">
            <a href="/dp/{asin}"><img src="thumb.jpg"></a>
            <h2><a href="/dp/{asin}">{title}</a></h2>
        </div>"#
    )
}

fn offer_row(seller: &str, price: &str, shipping: &str) -> String {
    format!(
        r#"<div id="aod-offer">
            <div id="aod-offer-soldBy"><a href="/seller">{seller}</a></div>
            <span class="a-price"><span class="a-offscreen">{price}</span></span>
            <span id="aod-offer-shippingCharge">{shipping}</span>
        </div>"#
    )
}

/// Runs a fresh crawl against the mocks, collecting records in memory
async fn run_crawl(config: Config) -> (CrawlStats, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let sink_handle: Arc<dyn Sink> = sink.clone();
    let mut driver =
        Driver::with_sink(config, true, "test-hash", sink_handle).expect("Failed to build driver");
    let stats = driver.run().await.expect("Crawl failed");
    (stats, sink)
}

#[tokio::test]
async fn test_full_pipeline_emits_offers() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // Search page: two real products plus a sponsored placeholder
    let search_body = format!(
        r#"<div class="s-result-item" data-asin="">
            <h2><a href="/sponsored">Sponsored</a></h2>
        </div>{}{}"#,
        result_item("B08X1", "Zenbook 14"),
        result_item("B09Y2", "Zenbook Pro"),
    );
    Mock::given(method("GET"))
        .and(path("/s"))
        .and(query_param("k", "asus zenbook"))
        .respond_with(html_response(search_body))
        .mount(&mock_server)
        .await;

    // Detail pages: B08X1 has a description, B09Y2 omits the container
    Mock::given(method("GET"))
        .and(path("/dp/B08X1"))
        .respond_with(html_response(
            r#"<div id="productDescription"><p>A thin and light laptop.</p></div>"#.to_string(),
        ))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/dp/B09Y2"))
        .respond_with(html_response("<h1>Zenbook Pro</h1>".to_string()))
        .mount(&mock_server)
        .await;

    // Offer listings: one row has empty shipping text
    Mock::given(method("GET"))
        .and(path("/gp/offer-listing/B08X1"))
        .respond_with(html_response(format!(
            "{}{}",
            offer_row("TechWorld", "$999.00", "$5.99"),
            offer_row("LaptopHut", "$949.50", ""),
        )))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gp/offer-listing/B09Y2"))
        .respond_with(html_response(offer_row("ProStore", "$1,299.00", "")))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&base_url, "asus zenbook", &dir);
    let (stats, sink) = run_crawl(config).await;

    // 1 search + 2 detail + 2 offer pages
    assert_eq!(stats.requests_handled, 5);
    assert_eq!(stats.search_pages, 1);
    assert_eq!(stats.description_pages, 2);
    assert_eq!(stats.offer_pages, 2);
    assert_eq!(stats.offers_emitted, 3);
    assert_eq!(stats.failures, 0);
    assert_eq!(stats.retries, 0);

    let offers = sink.offers();
    assert_eq!(offers.len(), 3);
    assert!(sink.failures().is_empty());

    // Every record carries the full accumulated context
    for offer in &offers {
        assert_eq!(offer.keyword, "asus zenbook");
        assert!(offer.title.is_some());
        assert!(offer.item_url.contains("/dp/"));
    }

    let zenbook_offers: Vec<_> = offers
        .iter()
        .filter(|offer| offer.item_url.ends_with("/dp/B08X1"))
        .collect();
    assert_eq!(zenbook_offers.len(), 2);
    for offer in &zenbook_offers {
        assert_eq!(offer.title.as_deref(), Some("Zenbook 14"));
        assert_eq!(offer.description.as_deref(), Some("A thin and light laptop."));
    }
    let shippings: Vec<&str> = zenbook_offers
        .iter()
        .map(|offer| offer.shipping.as_str())
        .collect();
    assert!(shippings.contains(&"$5.99"));
    // Empty shipping text is substituted with the free default
    assert!(shippings.contains(&"free"));

    // The listing without a description container flows through as null
    let pro_offer = offers
        .iter()
        .find(|offer| offer.item_url.ends_with("/dp/B09Y2"))
        .expect("Missing Zenbook Pro offer");
    assert_eq!(pro_offer.description, None);
    assert_eq!(pro_offer.seller, "ProStore");
    assert_eq!(pro_offer.shipping, "free");

    // The queue is fully settled
    let queue = SqliteQueue::new(&dir.path().join("queue.db")).unwrap();
    let counts = queue.counts().unwrap();
    assert_eq!(counts.pending, 0);
    assert_eq!(counts.in_flight, 0);
    assert_eq!(counts.done, 5);
    assert_eq!(counts.failed, 0);
}

#[tokio::test]
async fn test_retry_exhaustion_emits_single_debug_record() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/s"))
        .and(query_param("k", "asus zenbook"))
        .respond_with(html_response(result_item("B08X1", "Zenbook 14")))
        .mount(&mock_server)
        .await;

    // The detail page never recovers
    Mock::given(method("GET"))
        .and(path("/dp/B08X1"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&base_url, "asus zenbook", &dir);
    let (stats, sink) = run_crawl(config).await;

    // 1 search + 3 attempts at the detail page (first try + 2 retries)
    assert_eq!(stats.requests_handled, 4);
    assert_eq!(stats.retries, 2);
    assert_eq!(stats.failures, 1);
    assert_eq!(stats.offers_emitted, 0);

    // Exactly one debug record, zero offers for the dead branch
    assert!(sink.offers().is_empty());
    let failures = sink.failures();
    assert_eq!(failures.len(), 1);

    let diagnostics = &failures[0].diagnostics;
    assert!(diagnostics.url.ends_with("/dp/B08X1"));
    assert_eq!(diagnostics.stage, "extract_description");
    assert_eq!(diagnostics.retry_count, 2);
    assert_eq!(diagnostics.error, "HTTP 500");
}

#[tokio::test]
async fn test_budget_cap_stops_popping_work() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/s"))
        .and(query_param("k", "asus zenbook"))
        .respond_with(html_response(format!(
            "{}{}",
            result_item("B08X1", "Zenbook 14"),
            result_item("B09Y2", "Zenbook Pro"),
        )))
        .mount(&mock_server)
        .await;

    // Detail pages exist but the budget must stop the crawl first
    Mock::given(method("GET"))
        .respond_with(html_response("<h1>detail</h1>".to_string()))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&base_url, "asus zenbook", &dir);
    config.crawler.max_requests_per_crawl = 1;
    let (stats, sink) = run_crawl(config).await;

    // Only the search item was handled; its fan-out stays queued
    assert_eq!(stats.requests_handled, 1);
    assert_eq!(stats.items_enqueued, 2);
    assert_eq!(stats.offers_emitted, 0);
    assert!(sink.records().is_empty());

    let queue = SqliteQueue::new(&dir.path().join("queue.db")).unwrap();
    let counts = queue.counts().unwrap();
    assert_eq!(counts.pending, 2);
    assert_eq!(counts.done, 1);
}

#[tokio::test]
async fn test_empty_search_results_complete_cleanly() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/s"))
        .and(query_param("k", "nonexistent product"))
        .respond_with(html_response("<h1>No results</h1>".to_string()))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&base_url, "nonexistent product", &dir);
    let (stats, sink) = run_crawl(config).await;

    assert_eq!(stats.requests_handled, 1);
    assert_eq!(stats.items_enqueued, 0);
    assert_eq!(stats.offers_emitted, 0);
    assert_eq!(stats.failures, 0);
    assert!(sink.records().is_empty());
}

#[tokio::test]
async fn test_duplicate_detail_urls_enqueue_once() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // Two containers pointing at the same detail page
    Mock::given(method("GET"))
        .and(path("/s"))
        .and(query_param("k", "asus zenbook"))
        .respond_with(html_response(format!(
            "{}{}",
            result_item("B08X1", "Zenbook 14"),
            result_item("B08X1", "Zenbook 14"),
        )))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/dp/B08X1"))
        .respond_with(html_response(
            r#"<div id="productDescription">A laptop.</div>"#.to_string(),
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/gp/offer-listing/B08X1"))
        .respond_with(html_response(offer_row("TechWorld", "$999.00", "$5.99")))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&base_url, "asus zenbook", &dir);
    let (stats, sink) = run_crawl(config).await;

    // The duplicate URL was deduplicated by the queue
    assert_eq!(stats.items_enqueued, 2); // one detail + one offer listing
    assert_eq!(stats.duplicates_skipped, 1);
    assert_eq!(stats.requests_handled, 3);
    assert_eq!(sink.offers().len(), 1);
}
