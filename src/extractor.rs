//! # Content Extractor Module
//!
//! Pulls clean article content and metadata out of a fetched HTML page.
//!
//! ## Strategies
//!
//! - **Structured**: locates a semantic content container (`articleBody`
//!   microdata, `<article>`, `<main>`, common article-body classes) and
//!   rebuilds it as cleaned HTML
//! - **Heuristic**: Mozilla's readability algorithm scores the page by text
//!   density and keeps the best candidate
//! - **Raw**: the untouched page HTML, returned with `success = false` when
//!   nothing else worked
//!
//! [`ExtractMode::Auto`] tries structured, then heuristic, then raw. An
//! explicit mode runs only the requested strategy and reports failure
//! instead of falling through.
//!
//! ## Usage
//!
//! ```
//! use linkvault::extractor::{ExtractMode, ExtractionMethod, extract};
//!
//! let html = format!(
//!     "<html><head><title>Hello</title></head><body><article><p>{}</p></article></body></html>",
//!     "word ".repeat(50)
//! );
//! let article = extract(&html, "https://example.com/hello", ExtractMode::Auto);
//! assert!(article.success);
//! assert_eq!(article.method, ExtractionMethod::Structured);
//! ```

mod clean;
mod config;
mod error;
mod heuristic;
mod metadata;
mod structured;

pub use config::{ExtractorConfig, ExtractorConfigBuilder};
pub use error::ExtractError;
pub use metadata::parse_date;

pub(crate) use clean::truncate_chars;
pub(crate) use metadata::collapse_whitespace;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, instrument};

/// Extraction strategy requested by the caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractMode {
    /// Structured, then heuristic, then raw
    #[default]
    Auto,
    /// Structured only
    Structured,
    /// Heuristic only
    Heuristic,
}

impl FromStr for ExtractMode {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(ExtractMode::Auto),
            "structured" => Ok(ExtractMode::Structured),
            "heuristic" => Ok(ExtractMode::Heuristic),
            other => Err(ExtractError::UnknownMode(other.to_string())),
        }
    }
}

impl fmt::Display for ExtractMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExtractMode::Auto => "auto",
            ExtractMode::Structured => "structured",
            ExtractMode::Heuristic => "heuristic",
        };
        f.write_str(name)
    }
}

/// Strategy that produced an article
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMethod {
    Structured,
    Heuristic,
    Raw,
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExtractionMethod::Structured => "structured",
            ExtractionMethod::Heuristic => "heuristic",
            ExtractionMethod::Raw => "raw",
        };
        f.write_str(name)
    }
}

/// Article content and metadata extracted from a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedArticle {
    /// Article title
    pub title: Option<String>,

    /// Cleaned article HTML; the full page for raw results
    pub body_html: String,

    /// First paragraph, truncated
    pub excerpt: Option<String>,

    /// Author name
    pub author: Option<String>,

    /// Publication date as declared by the page
    pub published_date: Option<DateTime<FixedOffset>>,

    /// Strategy that produced this article
    pub method: ExtractionMethod,

    /// Whether a real extraction strategy succeeded
    pub success: bool,

    /// URL the page was fetched from
    pub source_url: String,
}

impl ExtractedArticle {
    /// Last-resort result carrying the page HTML unchanged
    pub fn raw(html: &str, url: &str) -> Self {
        Self {
            title: None,
            body_html: html.to_string(),
            excerpt: None,
            author: None,
            published_date: None,
            method: ExtractionMethod::Raw,
            success: false,
            source_url: url.to_string(),
        }
    }

    /// Result of an explicit strategy that found nothing
    fn failed(url: &str, method: ExtractionMethod) -> Self {
        Self {
            title: None,
            body_html: String::new(),
            excerpt: None,
            author: None,
            published_date: None,
            method,
            success: false,
            source_url: url.to_string(),
        }
    }
}

/// Content extractor
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    config: ExtractorConfig,
}

impl Extractor {
    /// Create an extractor with the given configuration
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    /// Get the extractor's configuration
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Run the structured strategy alone
    pub fn extract_structured(&self, html: &str, url: &str) -> Result<ExtractedArticle, ExtractError> {
        structured::extract(html, url, &self.config)
    }

    /// Run the heuristic strategy alone
    pub fn extract_heuristic(&self, html: &str, url: &str) -> Result<ExtractedArticle, ExtractError> {
        heuristic::extract(html, url, &self.config)
    }

    /// Extract an article from `html` using `mode`
    ///
    /// Never fails: a failed explicit mode yields `success = false` with an
    /// empty body, and a failed `Auto` run yields the raw page.
    #[instrument(skip(self, html), fields(len = html.len()))]
    pub fn extract(&self, html: &str, url: &str, mode: ExtractMode) -> ExtractedArticle {
        match mode {
            ExtractMode::Structured => self
                .extract_structured(html, url)
                .unwrap_or_else(|e| {
                    debug!("Structured extraction failed: {}", e);
                    ExtractedArticle::failed(url, ExtractionMethod::Structured)
                }),
            ExtractMode::Heuristic => self
                .extract_heuristic(html, url)
                .unwrap_or_else(|e| {
                    debug!("Heuristic extraction failed: {}", e);
                    ExtractedArticle::failed(url, ExtractionMethod::Heuristic)
                }),
            ExtractMode::Auto => self
                .extract_structured(html, url)
                .or_else(|e| {
                    debug!("Structured extraction failed, trying heuristic: {}", e);
                    self.extract_heuristic(html, url)
                })
                .unwrap_or_else(|e| {
                    debug!("Heuristic extraction failed, returning raw HTML: {}", e);
                    ExtractedArticle::raw(html, url)
                }),
        }
    }
}

/// Extract an article with the default configuration
pub fn extract(html: &str, url: &str, mode: ExtractMode) -> ExtractedArticle {
    Extractor::default().extract(html, url, mode)
}
