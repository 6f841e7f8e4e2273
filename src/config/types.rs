use crate::extract::SelectorConfig;
use serde::Deserialize;

/// Main configuration structure for offerhound
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub http: HttpConfig,
    pub site: SiteConfig,
    pub output: OutputConfig,
}

/// Search input configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchConfig {
    /// Keyword seeding the crawl; required and non-empty (may also be
    /// supplied with --keyword on the command line)
    #[serde(default)]
    pub keyword: String,
}

/// Crawler budget configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Total work-item budget per run, counting retries
    #[serde(rename = "max-requests-per-crawl", default = "default_max_requests")]
    pub max_requests_per_crawl: u64,

    /// Retries per work item before it converts to a failure record
    #[serde(rename = "max-request-retries", default = "default_max_retries")]
    pub max_request_retries: u32,

    /// Maximum number of concurrently dispatched work items
    #[serde(rename = "max-concurrent-pages", default = "default_max_concurrent")]
    pub max_concurrent_pages: u32,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_requests_per_crawl: default_max_requests(),
            max_request_retries: default_max_retries(),
            max_concurrent_pages: default_max_concurrent(),
        }
    }
}

fn default_max_requests() -> u64 {
    100
}

fn default_max_retries() -> u32 {
    2
}

fn default_max_concurrent() -> u32 {
    5
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// User agent sent with every page fetch
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
        }
    }
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/120.0 Safari/537.36"
        .to_string()
}

/// Target site configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Base URL of the site being crawled
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Extraction selectors; site defaults apply when omitted
    #[serde(default)]
    pub selectors: SelectorConfig,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite work-queue database
    #[serde(rename = "queue-path")]
    pub queue_path: String,

    /// Path to the JSON-lines dataset file
    #[serde(rename = "dataset-path")]
    pub dataset_path: String,
}
