//! Error types for the crawler module

use crate::error::Error as CrateError;
use thiserror::Error;

use super::checkpoint::CheckpointError;

/// Error type for crawler operations
///
/// Individual job failures never surface here; they are recorded in the
/// job's [`FetchResult`](crate::fetcher::FetchResult).
#[derive(Debug, Error)]
pub enum CrawlError {
    /// The configuration cannot be run
    #[error("Invalid crawler configuration: {0}")]
    InvalidConfig(String),

    /// A batch checkpoint could not be written or read
    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl From<CrawlError> for CrateError {
    fn from(err: CrawlError) -> Self {
        match err {
            CrawlError::InvalidConfig(msg) => CrateError::InvalidRequest(msg),
            _ => CrateError::Crawl(err.to_string()),
        }
    }
}
