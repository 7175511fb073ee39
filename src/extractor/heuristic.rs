//! Heuristic extraction using Mozilla's readability algorithm

use scraper::Html;
use std::io::Cursor;
use tracing::debug;
use url::Url;

use super::clean::first_paragraph_excerpt;
use super::config::ExtractorConfig;
use super::error::ExtractError;
use super::metadata::{self, collapse_whitespace};
use super::{ExtractedArticle, ExtractionMethod};

/// Extract the main content by scoring text density
pub(super) fn extract(html: &str, url: &str, config: &ExtractorConfig) -> Result<ExtractedArticle, ExtractError> {
    let parsed_url = Url::parse(url)?;

    let mut cursor = Cursor::new(html.as_bytes());
    let product = readability::extractor::extract(&mut cursor, &parsed_url)
        .map_err(|e| ExtractError::Readability(e.to_string()))?;

    let text_len = collapse_whitespace(&product.text).chars().count();
    if text_len < config.min_text_length {
        return Err(ExtractError::TooShort(text_len));
    }
    let body_html = product.content.trim().to_string();
    if body_html.is_empty() {
        return Err(ExtractError::NoContent);
    }
    debug!("Readability extracted {} characters of text", text_len);

    let document = Html::parse_document(html);
    let json_ld = metadata::json_ld(&document);
    let title = Some(collapse_whitespace(&product.title))
        .filter(|title| !title.is_empty())
        .or_else(|| metadata::title(&document));

    Ok(ExtractedArticle {
        title,
        excerpt: first_paragraph_excerpt(&body_html, config.excerpt_length),
        author: metadata::author(&document, &json_ld),
        published_date: metadata::published_date(&document, &json_ld),
        body_html,
        method: ExtractionMethod::Heuristic,
        success: true,
        source_url: url.to_string(),
    })
}
