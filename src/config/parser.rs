use crate::config::types::Config;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// Parsing and validation are separate steps: callers apply command-line
/// overrides (like --keyword) to the parsed config and then run
/// [`crate::config::validate`] on the result.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully parsed configuration
/// * `Err(ConfigError)` - Failed to read or parse the configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    // Read the configuration file
    let content = std::fs::read_to_string(path)?;

    // Parse TOML
    let config: Config = toml::from_str(&content)?;

    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// The hash is recorded with each crawl run so a changed configuration is
/// detectable when inspecting old queue databases.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[search]
keyword = "asus zenbook"

[crawler]
max-requests-per-crawl = 50
max-request-retries = 3
max-concurrent-pages = 10

[site]
base-url = "https://www.example.com"

[output]
queue-path = "./queue.db"
dataset-path = "./offers.jsonl"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.search.keyword, "asus zenbook");
        assert_eq!(config.crawler.max_requests_per_crawl, 50);
        assert_eq!(config.crawler.max_request_retries, 3);
        assert_eq!(config.crawler.max_concurrent_pages, 10);
        assert_eq!(config.site.base_url, "https://www.example.com");
    }

    #[test]
    fn test_load_config_applies_defaults() {
        let config_content = r#"
[site]
base-url = "https://www.example.com"

[output]
queue-path = "./queue.db"
dataset-path = "./offers.jsonl"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        // Budgets fall back to defaults, the keyword stays empty until a
        // command-line override supplies one
        assert_eq!(config.crawler.max_requests_per_crawl, 100);
        assert_eq!(config.crawler.max_request_retries, 2);
        assert_eq!(config.crawler.max_concurrent_pages, 5);
        assert!(config.search.keyword.is_empty());
        assert!(!config.http.user_agent.is_empty());
    }

    #[test]
    fn test_load_config_with_selector_overrides() {
        let config_content = r#"
[site]
base-url = "https://www.example.com"

[site.selectors]
result-item = "li.product[data-id]"
asin-attribute = "data-id"

[output]
queue-path = "./queue.db"
dataset-path = "./offers.jsonl"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.site.selectors.result_item, "li.product[data-id]");
        assert_eq!(config.site.selectors.asin_attribute, "data-id");
        // Unset selectors keep their defaults
        assert_eq!(config.site.selectors.title_link, "h2 a");
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let config_content = "this is not valid TOML {{{";
        let file = create_temp_config(config_content);
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_compute_config_hash() {
        let config_content = "test content";
        let file = create_temp_config(config_content);

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        // Same content should produce same hash
        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64); // SHA-256 produces 64 hex characters
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_config("content 1");
        let file2 = create_temp_config("content 2");

        let hash1 = compute_config_hash(file1.path()).unwrap();
        let hash2 = compute_config_hash(file2.path()).unwrap();

        assert_ne!(hash1, hash2);
    }
}
