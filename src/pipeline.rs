//! Single-URL conversion pipeline
//!
//! Fetch, extract, render and score one link. Every failure is returned as a
//! [`ConversionFailure`] carrying the classified error together with the
//! fetch metadata, so callers can still update their crawl records.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info, instrument, warn};

use crate::cache::{DEFAULT_TTL, ResponseCache};
use crate::error::{ErrorInfo, ErrorKind, Result};
use crate::extractor::{ExtractMode, ExtractedArticle, Extractor};
use crate::fetcher::{FetchResult, PageFetcher};
use crate::markdown::{LinkMetadata, MarkdownDocument, render};
use crate::normalize::normalize;
use crate::quality::QualityReport;

/// Options for one conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertOptions {
    /// Extraction strategy
    pub mode: ExtractMode,

    /// Whether the note starts with a frontmatter block
    pub include_frontmatter: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            mode: ExtractMode::Auto,
            include_frontmatter: true,
        }
    }
}

/// A successfully converted link
#[derive(Debug, Clone)]
pub struct Conversion {
    pub fetch: FetchResult,
    pub article: ExtractedArticle,
    pub document: MarkdownDocument,
    pub quality: QualityReport,
    /// Whether the page came from the response cache
    pub from_cache: bool,
}

impl Conversion {
    /// The rendered note text
    pub fn markdown(&self) -> String {
        self.document.to_markdown()
    }
}

/// A conversion that stopped at some stage
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{url}: {error}")]
pub struct ConversionFailure {
    /// URL as requested
    pub url: String,

    /// URL after redirects, normalized
    pub final_url: String,

    /// Status of the last response, if any
    pub status_code: Option<u16>,

    /// Redirects followed
    pub redirect_count: u32,

    /// What went wrong
    pub error: ErrorInfo,

    /// Quality signals for what was obtained before the failure
    pub quality: QualityReport,
}

impl ConversionFailure {
    fn new(fetch: &FetchResult, error: ErrorInfo, has_content: bool) -> Self {
        Self {
            url: fetch.original_url.clone(),
            final_url: fetch.final_url.clone(),
            status_code: fetch.status_code,
            redirect_count: fetch.redirect_count,
            error,
            quality: QualityReport::assess(fetch, has_content, false),
        }
    }

    /// Kind of the failure
    pub fn kind(&self) -> ErrorKind {
        self.error.kind
    }
}

/// Converts links into markdown notes
pub struct Converter<F: PageFetcher> {
    fetcher: F,
    extractor: Extractor,
    cache: Option<Arc<dyn ResponseCache<FetchResult>>>,
    cache_ttl: Duration,
}

impl<F: PageFetcher> Converter<F> {
    /// Create a converter with the default extractor and no cache
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            extractor: Extractor::default(),
            cache: None,
            cache_ttl: DEFAULT_TTL,
        }
    }

    /// Use a custom extractor
    pub fn with_extractor(mut self, extractor: Extractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Cache successful fetches for `ttl`, keyed by normalized URL
    pub fn with_cache(mut self, cache: Arc<dyn ResponseCache<FetchResult>>, ttl: Duration) -> Self {
        self.cache = Some(cache);
        self.cache_ttl = ttl;
        self
    }

    /// Drop the cached response for a URL
    pub fn invalidate(&self, url: &str) -> bool {
        self.cache
            .as_ref()
            .is_some_and(|cache| cache.invalidate(&normalize(url)))
    }

    async fn fetch(&self, url: &str) -> (FetchResult, bool) {
        let key = normalize(url);
        if let Some(cached) = self.cache.as_ref().and_then(|cache| cache.get(&key)) {
            debug!("Using cached response for {}", key);
            return (cached, true);
        }

        let result = self.fetcher.fetch(url).await;
        if let Some(cache) = &self.cache {
            if result.is_success() {
                cache.insert(&key, result.clone(), self.cache_ttl);
            }
        }
        (result, false)
    }

    /// Convert a URL into a markdown note
    #[instrument(skip(self, metadata), fields(mode = %options.mode))]
    pub async fn convert(
        &self,
        url: &str,
        options: &ConvertOptions,
        metadata: &LinkMetadata,
    ) -> std::result::Result<Conversion, ConversionFailure> {
        let (fetch, from_cache) = self.fetch(url).await;

        let html = match (&fetch.error, &fetch.raw_html) {
            (None, Some(html)) => html,
            (error, _) => {
                let error = error
                    .clone()
                    .unwrap_or_else(|| ErrorInfo::new(ErrorKind::UnknownError, "Failed to fetch URL"));
                warn!("Fetch failed for {}: {}", url, error);
                return Err(ConversionFailure::new(&fetch, error, false));
            }
        };

        let article = self.extractor.extract(html, &fetch.final_url, options.mode);
        if !article.success || article.body_html.is_empty() {
            warn!("Extraction failed for {} using {}", fetch.final_url, options.mode);
            let error = ErrorInfo::new(ErrorKind::ExtractionFailed, "Failed to extract content");
            return Err(ConversionFailure::new(&fetch, error, false));
        }

        let document = match render(&article, metadata) {
            Ok(document) => document,
            Err(e) => {
                warn!("Rendering failed for {}: {}", fetch.final_url, e);
                let error = ErrorInfo::new(ErrorKind::MarkdownConversionFailed, e.to_string());
                return Err(ConversionFailure::new(&fetch, error, true));
            }
        };
        let document = if options.include_frontmatter {
            document
        } else {
            document.without_frontmatter()
        };

        let quality = QualityReport::assess(&fetch, true, true);
        info!(
            method = %article.method,
            score = quality.score,
            "Converted {}",
            fetch.final_url
        );

        Ok(Conversion {
            fetch,
            article,
            document,
            quality,
            from_cache,
        })
    }
}

/// Write a conversion's note to `path`, creating parent directories
pub async fn write_markdown(conversion: &Conversion, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }
    fs::write(path, conversion.markdown()).await?;
    info!("Markdown written to {}", path.display());
    Ok(())
}
