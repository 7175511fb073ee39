//! Error types for the markdown module

use crate::error::Error as CrateError;
use thiserror::Error;

/// Error type for markdown rendering
#[derive(Debug, Error)]
pub enum RenderError {
    /// The article had no HTML body to convert
    #[error("Article body is empty")]
    EmptyBody,

    /// The HTML to markdown converter failed
    #[error("Markdown conversion failed: {0}")]
    Conversion(String),

    /// Conversion produced no markdown text
    #[error("Markdown conversion produced no content")]
    EmptyMarkdown,
}

impl From<RenderError> for CrateError {
    fn from(err: RenderError) -> Self {
        CrateError::Render(err.to_string())
    }
}
