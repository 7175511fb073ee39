//! Error types for the extractor module

use crate::error::Error as CrateError;
use thiserror::Error;

/// Error type for a single extraction strategy
#[derive(Debug, Error)]
pub enum ExtractError {
    /// No content container could be located
    #[error("No article content found")]
    NoContent,

    /// Content was found but is below the configured minimum length
    #[error("Extracted text too short: {0} characters")]
    TooShort(usize),

    /// The readability algorithm failed
    #[error("Readability error: {0}")]
    Readability(String),

    /// URL parsing error
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Unknown extraction mode name
    #[error("Unknown extraction mode '{0}', expected auto, structured or heuristic")]
    UnknownMode(String),
}

impl From<ExtractError> for CrateError {
    fn from(err: ExtractError) -> Self {
        CrateError::Extract(err.to_string())
    }
}
