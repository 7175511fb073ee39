//! # HTTP Fetcher
//!
//! Fetches a single URL with a browser-like header set, following redirects
//! by hand so every hop is counted. The fetcher is total: every outcome,
//! including network failures, comes back as a [`FetchResult`] whose
//! `error` field carries a classified [`ErrorInfo`].
//!
//! ## Key Components
//!
//! - `Fetcher`: reqwest-backed fetcher with a persistent connection pool
//! - `FetchResult`: outcome of one fetch
//! - `PageFetcher`: the seam the crawler and conversion pipeline are generic over

mod config;

pub use config::{BROWSER_HEADERS, DEFAULT_USER_AGENT, FetcherConfig, FetcherConfigBuilder};

use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::{Client as ReqwestClient, Response, StatusCode, redirect::Policy};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::error::{ErrorInfo, ErrorKind, Result};
use crate::normalize::normalize;

/// Outcome of fetching one URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchResult {
    /// URL as requested
    pub original_url: String,

    /// URL after redirects, normalized
    pub final_url: String,

    /// Status code of the last response, if any response arrived
    pub status_code: Option<u16>,

    /// Number of redirects followed
    pub redirect_count: u32,

    /// Wall-clock time of the fetch in seconds, rounded to two decimals
    pub response_time_seconds: Option<f64>,

    /// Content-Type of the last response
    pub content_type: Option<String>,

    /// Classified failure; set exactly when `raw_html` is absent
    pub error: Option<ErrorInfo>,

    /// Page HTML on success
    pub raw_html: Option<String>,
}

impl FetchResult {
    /// Build a failed result
    pub fn failure(original_url: &str, final_url: &str, error: ErrorInfo) -> Self {
        Self {
            original_url: original_url.to_string(),
            final_url: normalize(final_url),
            status_code: None,
            redirect_count: 0,
            response_time_seconds: None,
            content_type: None,
            error: Some(error),
            raw_html: None,
        }
    }

    /// Whether the fetch produced HTML
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Whether at least one redirect was followed
    pub fn was_redirected(&self) -> bool {
        self.redirect_count > 0
    }

    /// Kind of the failure, if any
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }

    fn with_timing(mut self, started: Instant) -> Self {
        let elapsed = started.elapsed().as_secs_f64();
        self.response_time_seconds = Some((elapsed * 100.0).round() / 100.0);
        self
    }
}

/// Something that can turn a URL into a [`FetchResult`]
///
/// Implementations must be total: failures are reported through
/// `FetchResult::error`, never by panicking.
pub trait PageFetcher: Send + Sync + 'static {
    /// Fetch a URL
    fn fetch(&self, url: &str) -> impl Future<Output = FetchResult> + Send;
}

/// HTTP fetcher backed by a pooled reqwest client
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: ReqwestClient,
    config: FetcherConfig,
}

impl Fetcher {
    /// Create a new fetcher
    pub fn new(config: FetcherConfig) -> Result<Self> {
        let client = ReqwestClient::builder()
            .default_headers(config.header_map()?)
            .user_agent(config.user_agent.clone())
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .redirect(Policy::none())
            .build()?;

        Ok(Self { client, config })
    }

    /// Create a fetcher with the default configuration
    pub fn with_defaults() -> Result<Self> {
        Self::new(FetcherConfig::default())
    }

    /// The configuration this fetcher was built with
    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    /// Fetch a URL using the configured timeout
    pub async fn fetch(&self, url: &str) -> FetchResult {
        self.fetch_with_timeout(url, self.config.timeout).await
    }

    /// Fetch a URL with an explicit overall timeout
    #[instrument(skip(self), level = "debug")]
    pub async fn fetch_with_timeout(&self, url: &str, timeout: Duration) -> FetchResult {
        let started = Instant::now();

        let mut current = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(e) => {
                return FetchResult::failure(
                    url,
                    url,
                    ErrorInfo::new(ErrorKind::RequestError, format!("Invalid URL: {}", e)),
                )
                .with_timing(started);
            }
        };
        let mut redirect_count = 0;

        loop {
            let Some(remaining) = timeout.checked_sub(started.elapsed()) else {
                return self.failed(url, &current, redirect_count, started, timeout_error());
            };

            let response = match self.client.get(current.clone()).timeout(remaining).send().await {
                Ok(response) => response,
                Err(e) => {
                    let error = classify_error(&e);
                    warn!(url = %current, kind = %error.kind, "Fetch failed: {}", e);
                    return self.failed(url, &current, redirect_count, started, error);
                }
            };

            if response.status().is_redirection() {
                if let Some(next) = redirect_target(&current, &response) {
                    if redirect_count >= self.config.max_redirects {
                        let error = ErrorInfo::new(
                            ErrorKind::RequestError,
                            format!("Exceeded {} redirects", self.config.max_redirects),
                        );
                        let mut result = self.failed(url, &current, redirect_count, started, error);
                        result.status_code = Some(response.status().as_u16());
                        return result;
                    }
                    redirect_count += 1;
                    debug!(from = %current, to = %next, "Following redirect");
                    current = next;
                    continue;
                }
            }

            return self
                .finish(url, current, redirect_count, started, response)
                .await;
        }
    }

    fn failed(
        &self,
        original_url: &str,
        current: &Url,
        redirect_count: u32,
        started: Instant,
        error: ErrorInfo,
    ) -> FetchResult {
        let mut result = FetchResult::failure(original_url, current.as_str(), error);
        result.redirect_count = redirect_count;
        result.with_timing(started)
    }

    async fn finish(
        &self,
        original_url: &str,
        final_url: Url,
        redirect_count: u32,
        started: Instant,
        response: Response,
    ) -> FetchResult {
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_lowercase());

        let mut result = FetchResult {
            original_url: original_url.to_string(),
            final_url: normalize(final_url.as_str()),
            status_code: Some(status.as_u16()),
            redirect_count,
            response_time_seconds: None,
            content_type: content_type.clone(),
            error: None,
            raw_html: None,
        };

        match classify_status(status, content_type.as_deref()) {
            Some(error) => result.error = Some(error),
            None => match response.text().await {
                Ok(body) => result.raw_html = Some(body),
                Err(e) => result.error = Some(classify_error(&e)),
            },
        }

        debug!(
            url = %result.final_url,
            status = status.as_u16(),
            redirects = redirect_count,
            "Fetched"
        );
        result.with_timing(started)
    }
}

impl PageFetcher for Fetcher {
    async fn fetch(&self, url: &str) -> FetchResult {
        self.fetch_with_timeout(url, self.config.timeout).await
    }
}

/// Resolve the Location header of a redirect response against the current URL
fn redirect_target(current: &Url, response: &Response) -> Option<Url> {
    let location = response.headers().get(LOCATION)?.to_str().ok()?;
    current.join(location).ok()
}

/// Decide whether a final response is a failure, before reading its body
fn classify_status(status: StatusCode, content_type: Option<&str>) -> Option<ErrorInfo> {
    let code = status.as_u16();
    if status.is_success() {
        let content_type = content_type.unwrap_or_default();
        if is_html(content_type) {
            None
        } else {
            Some(ErrorInfo::new(
                ErrorKind::ContentTypeError,
                format!("Not HTML content: {}", content_type),
            ))
        }
    } else if status.is_client_error() {
        Some(ErrorInfo::new(ErrorKind::HttpClientError, format!("HTTP {}", code)))
    } else if status.is_server_error() {
        Some(ErrorInfo::new(ErrorKind::HttpServerError, format!("HTTP {}", code)))
    } else {
        Some(ErrorInfo::new(ErrorKind::RequestError, format!("HTTP {}", code)))
    }
}

fn is_html(content_type: &str) -> bool {
    content_type.contains("text/html") || content_type.contains("application/xhtml+xml")
}

fn timeout_error() -> ErrorInfo {
    ErrorInfo::new(ErrorKind::Timeout, "Request timeout")
}

/// Map a reqwest transport error onto the failure taxonomy
fn classify_error(error: &reqwest::Error) -> ErrorInfo {
    if error.is_timeout() {
        timeout_error()
    } else if error.is_connect() {
        ErrorInfo::new(ErrorKind::ConnectionError, format!("Connection error: {}", error))
    } else if error.is_request()
        || error.is_body()
        || error.is_decode()
        || error.is_redirect()
        || error.is_builder()
    {
        ErrorInfo::new(ErrorKind::RequestError, format!("Request error: {}", error))
    } else {
        ErrorInfo::new(ErrorKind::UnknownError, format!("Unexpected error: {}", error))
    }
}
