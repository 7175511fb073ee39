//! Error types for the linkvault crate
//!
//! Two families live here. [`Error`] is the conventional `std::error::Error`
//! returned by constructors and I/O helpers. [`ErrorKind`] and [`ErrorInfo`]
//! are the failure taxonomy carried *inside* pipeline results: fetching and
//! extraction never return `Err` across the public boundary, they report a
//! classified failure as data instead.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type for linkvault operations
pub type Result<T> = std::result::Result<T, Error>;

/// Maximum length of an [`ErrorInfo`] message, in characters
pub const MAX_ERROR_MESSAGE_CHARS: usize = 200;

/// Error type for linkvault operations
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP client construction or transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration or request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Content extraction error
    #[error("Extraction error: {0}")]
    Extract(String),

    /// Markdown rendering error
    #[error("Render error: {0}")]
    Render(String),

    /// Batch crawl error
    #[error("Crawl error: {0}")]
    Crawl(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

/// Classified failure kind for a fetch, extraction or conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The request did not complete within its timeout
    Timeout,
    /// DNS, TCP or TLS failure before a response arrived
    ConnectionError,
    /// The server answered with a 4xx status
    HttpClientError,
    /// The server answered with a 5xx status
    HttpServerError,
    /// The response was not HTML
    ContentTypeError,
    /// Any other request-level failure (bad URL, redirect loop, body read)
    RequestError,
    /// No extraction strategy produced article content
    ExtractionFailed,
    /// Extracted HTML could not be turned into markdown
    MarkdownConversionFailed,
    /// Anything not covered above
    UnknownError,
}

impl ErrorKind {
    /// All kinds, in declaration order
    pub const ALL: [ErrorKind; 9] = [
        ErrorKind::Timeout,
        ErrorKind::ConnectionError,
        ErrorKind::HttpClientError,
        ErrorKind::HttpServerError,
        ErrorKind::ContentTypeError,
        ErrorKind::RequestError,
        ErrorKind::ExtractionFailed,
        ErrorKind::MarkdownConversionFailed,
        ErrorKind::UnknownError,
    ];

    /// The snake_case name used in serialized records
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Timeout => "timeout",
            ErrorKind::ConnectionError => "connection_error",
            ErrorKind::HttpClientError => "http_client_error",
            ErrorKind::HttpServerError => "http_server_error",
            ErrorKind::ContentTypeError => "content_type_error",
            ErrorKind::RequestError => "request_error",
            ErrorKind::ExtractionFailed => "extraction_failed",
            ErrorKind::MarkdownConversionFailed => "markdown_conversion_failed",
            ErrorKind::UnknownError => "unknown_error",
        }
    }

    /// Whether retrying the same request might succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, ErrorKind::Timeout | ErrorKind::ConnectionError)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified failure with a human-readable message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Failure classification
    pub kind: ErrorKind,

    /// Human-readable description, capped at [`MAX_ERROR_MESSAGE_CHARS`]
    pub message: String,
}

impl ErrorInfo {
    /// Create a new error info, truncating long messages
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = match message.char_indices().nth(MAX_ERROR_MESSAGE_CHARS) {
            Some((cut, _)) => message[..cut].to_string(),
            None => message,
        };
        Self { kind, message }
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}
