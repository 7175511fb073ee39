//! # linkvault - Personal link archive pipeline
//!
//! This crate turns saved web links into a durable local archive. It checks
//! where each link ends up, pulls the readable article out of the page and
//! renders it as a markdown note with YAML frontmatter.
//!
//! ## Features
//!
//! - URL normalization that strips tracking parameters and fragments
//! - Browser-like fetching with manual redirect tracking and a classified
//!   failure taxonomy
//! - Article extraction from semantic markup with a readability fallback
//! - Markdown rendering with Obsidian-style frontmatter
//! - Quality scoring of fetch and conversion signals
//! - Checkpointed, resumable batch crawling over thousands of links
//! - Async API with Tokio
//!
//! ## Example
//!
//! ```rust,no_run
//! use linkvault::fetcher::Fetcher;
//! use linkvault::markdown::LinkMetadata;
//! use linkvault::pipeline::{ConvertOptions, Converter};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let converter = Converter::new(Fetcher::with_defaults()?);
//!     let conversion = converter
//!         .convert(
//!             "https://example.com/post?utm_source=feed",
//!             &ConvertOptions::default(),
//!             &LinkMetadata::default(),
//!         )
//!         .await?;
//!
//!     println!("{}", conversion.markdown());
//!     Ok(())
//! }
//! ```

mod error;

pub mod cache;
pub mod crawler;
pub mod extractor;
pub mod fetcher;
pub mod markdown;
pub mod normalize;
pub mod pipeline;
pub mod quality;

pub use error::{Error, ErrorInfo, ErrorKind, MAX_ERROR_MESSAGE_CHARS, Result};

/// Commonly used types
pub mod prelude {
    pub use crate::error::{Error, ErrorInfo, ErrorKind, Result};
    pub use crate::extractor::{ExtractMode, ExtractedArticle, Extractor};
    pub use crate::fetcher::{FetchResult, Fetcher, PageFetcher};
    pub use crate::markdown::{LinkMetadata, MarkdownDocument};
    pub use crate::pipeline::{ConvertOptions, Conversion, Converter};
}
