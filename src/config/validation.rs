use crate::config::types::{Config, CrawlerConfig, HttpConfig, OutputConfig, SiteConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
///
/// Validation runs after any command-line overrides have been applied, so a
/// keyword supplied with --keyword satisfies the non-empty requirement even
/// when the file omits it.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_keyword(&config.search.keyword)?;
    validate_crawler_config(&config.crawler)?;
    validate_http_config(&config.http)?;
    validate_site_config(&config.site)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the search keyword: required, non-empty after trimming
fn validate_keyword(keyword: &str) -> Result<(), ConfigError> {
    if keyword.trim().is_empty() {
        return Err(ConfigError::Validation(
            "keyword must be a non-empty string (set [search] keyword or pass --keyword)"
                .to_string(),
        ));
    }
    Ok(())
}

/// Validates crawler budget configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_requests_per_crawl < 1 {
        return Err(ConfigError::Validation(format!(
            "max_requests_per_crawl must be >= 1, got {}",
            config.max_requests_per_crawl
        )));
    }

    if config.max_concurrent_pages < 1 || config.max_concurrent_pages > 100 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_pages must be between 1 and 100, got {}",
            config.max_concurrent_pages
        )));
    }

    // max_request_retries of 0 is valid: items fail on their first error

    Ok(())
}

/// Validates HTTP client configuration
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates the target site configuration
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "base_url must use an http(s) scheme, got '{}'",
            url.scheme()
        )));
    }

    config
        .selectors
        .check()
        .map_err(|e| ConfigError::InvalidSelector(e.to_string()))?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.queue_path.is_empty() {
        return Err(ConfigError::Validation(
            "queue_path cannot be empty".to_string(),
        ));
    }

    if config.dataset_path.is_empty() {
        return Err(ConfigError::Validation(
            "dataset_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::SearchConfig;

    fn create_test_config() -> Config {
        Config {
            search: SearchConfig {
                keyword: "asus zenbook".to_string(),
            },
            crawler: CrawlerConfig::default(),
            http: HttpConfig::default(),
            site: SiteConfig {
                base_url: "https://www.example.com".to_string(),
                selectors: Default::default(),
            },
            output: OutputConfig {
                queue_path: "./queue.db".to_string(),
                dataset_path: "./offers.jsonl".to_string(),
            },
        }
    }

    #[test]
    fn test_valid_config() {
        let config = create_test_config();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_empty_keyword_rejected() {
        let mut config = create_test_config();
        config.search.keyword = "".to_string();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));

        config.search.keyword = "   ".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_request_budget_rejected() {
        let mut config = create_test_config();
        config.crawler.max_requests_per_crawl = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_retries_allowed() {
        let mut config = create_test_config();
        config.crawler.max_request_retries = 0;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_concurrency_bounds() {
        let mut config = create_test_config();
        config.crawler.max_concurrent_pages = 0;
        assert!(validate(&config).is_err());

        config.crawler.max_concurrent_pages = 101;
        assert!(validate(&config).is_err());

        config.crawler.max_concurrent_pages = 100;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let mut config = create_test_config();
        config.site.base_url = "not a url".to_string();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidUrl(_))
        ));

        config.site.base_url = "ftp://example.com".to_string();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_invalid_selector_rejected() {
        let mut config = create_test_config();
        config.site.selectors.result_item = ":::".to_string();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidSelector(_))
        ));
    }

    #[test]
    fn test_empty_output_paths_rejected() {
        let mut config = create_test_config();
        config.output.queue_path = "".to_string();
        assert!(validate(&config).is_err());

        let mut config = create_test_config();
        config.output.dataset_path = "".to_string();
        assert!(validate(&config).is_err());
    }
}
