//! # Fetcher Configuration Module
//!
//! Configuration for the HTTP fetcher: timeouts, redirect limit and the
//! request header set. The defaults mimic a desktop Chrome browser so that
//! sites doing trivial bot filtering still serve the page.
//!
//! ## Key Components
//!
//! - `FetcherConfig`: The configuration struct
//! - `FetcherConfigBuilder`: Builder pattern implementation for easier configuration

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::time::Duration;

use crate::error::{Error, Result};

/// Browser user agent sent with every request
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Header set sent alongside the user agent.
///
/// Accept-Encoding is negotiated by reqwest itself so that compressed bodies
/// are decoded transparently.
pub const BROWSER_HEADERS: &[(&str, &str)] = &[
    (
        "accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.7",
    ),
    ("accept-language", "en-US,en;q=0.9"),
    ("dnt", "1"),
    ("upgrade-insecure-requests", "1"),
    ("referer", "https://www.google.com/"),
    ("sec-fetch-dest", "document"),
    ("sec-fetch-mode", "navigate"),
    ("sec-fetch-site", "none"),
    ("sec-fetch-user", "?1"),
    ("cache-control", "max-age=0"),
];

/// Configuration for the fetcher
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Time allowed to establish a connection
    pub connect_timeout: Duration,

    /// Overall time allowed for a fetch, redirects included
    pub timeout: Duration,

    /// Maximum number of redirects to follow
    pub max_redirects: u32,

    /// User agent to use for requests
    pub user_agent: String,

    /// Additional headers, applied after the browser header set
    pub extra_headers: Vec<(String, String)>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            timeout: Duration::from_secs(30),
            max_redirects: 10,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            extra_headers: Vec::new(),
        }
    }
}

/// Builder for FetcherConfig
#[derive(Debug, Default)]
pub struct FetcherConfigBuilder {
    config: FetcherConfig,
}

impl FetcherConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: FetcherConfig::default(),
        }
    }

    /// Set the connect timeout
    pub fn connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.config.connect_timeout = connect_timeout;
        self
    }

    /// Set the overall request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the maximum number of redirects to follow
    pub fn max_redirects(mut self, max_redirects: u32) -> Self {
        self.config.max_redirects = max_redirects;
        self
    }

    /// Set the user agent to use for requests
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Add an extra request header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.extra_headers.push((name.into(), value.into()));
        self
    }

    /// Build the configuration
    pub fn build(self) -> FetcherConfig {
        self.config
    }
}

impl FetcherConfig {
    /// Create a new builder
    pub fn builder() -> FetcherConfigBuilder {
        FetcherConfigBuilder::new()
    }

    /// Assemble the default header map for the HTTP client
    pub fn header_map(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let pairs = BROWSER_HEADERS
            .iter()
            .map(|(name, value)| (*name, *value))
            .chain(
                self.extra_headers
                    .iter()
                    .map(|(name, value)| (name.as_str(), value.as_str())),
            );

        for (name, value) in pairs {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::InvalidRequest(format!("Invalid header name '{}': {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::InvalidRequest(format!("Invalid header value for '{}': {}", name, e)))?;
            headers.insert(name, value);
        }

        Ok(headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FetcherConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_redirects, 10);
        assert!(config.user_agent.starts_with("Mozilla/5.0"));
    }

    #[test]
    fn test_builder() {
        let config = FetcherConfig::builder()
            .timeout(Duration::from_secs(5))
            .max_redirects(2)
            .user_agent("linkvault-test")
            .header("x-test", "1")
            .build();

        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.max_redirects, 2);
        assert_eq!(config.user_agent, "linkvault-test");
        assert_eq!(config.extra_headers, vec![("x-test".to_string(), "1".to_string())]);
    }

    #[test]
    fn test_header_map() {
        let config = FetcherConfig::builder().header("referer", "https://example.org/").build();
        let headers = config.header_map().unwrap();

        assert_eq!(headers.get("accept-language").unwrap(), "en-US,en;q=0.9");
        assert_eq!(headers.get("sec-fetch-mode").unwrap(), "navigate");
        // extra headers override the browser set
        assert_eq!(headers.get("referer").unwrap(), "https://example.org/");
    }

    #[test]
    fn test_invalid_header_is_rejected() {
        let config = FetcherConfig::builder().header("bad header", "x").build();
        assert!(matches!(config.header_map(), Err(Error::InvalidRequest(_))));
    }
}
