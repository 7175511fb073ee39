//! Structured extraction from semantic content containers

use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use super::clean::{Cleaner, first_paragraph_excerpt, visible_text};
use super::config::ExtractorConfig;
use super::error::ExtractError;
use super::metadata;
use super::{ExtractedArticle, ExtractionMethod};

/// Content containers, most specific first
const CONTAINER_SELECTORS: &[&str] = &[
    "[itemprop=\"articleBody\"]",
    "article",
    "main",
    "[role=\"main\"]",
    ".post-content",
    ".entry-content",
    ".article-body",
    ".article-content",
    ".post-body",
    "#article-body",
    "#content",
];

/// Find the content container: the first selector whose largest match
/// carries at least `min_len` characters of visible text
fn find_container(document: &Html, min_len: usize) -> Option<(ElementRef<'_>, usize)> {
    CONTAINER_SELECTORS.iter().find_map(|css| {
        let selector = Selector::parse(css).ok()?;
        document
            .select(&selector)
            .map(|element| (element, visible_text(element).chars().count()))
            .max_by_key(|(_, len)| *len)
            .filter(|(_, len)| *len >= min_len)
    })
}

/// Extract an article from its semantic markup
pub(super) fn extract(html: &str, url: &str, config: &ExtractorConfig) -> Result<ExtractedArticle, ExtractError> {
    let document = Html::parse_document(html);

    let (container, text_len) = find_container(&document, config.min_text_length).ok_or(ExtractError::NoContent)?;
    debug!("Structured container found with {} characters of text", text_len);

    let base = if config.absolutize_links {
        Url::parse(url).ok()
    } else {
        None
    };
    let body_html = Cleaner::new(base.as_ref()).clean(container);
    if body_html.is_empty() {
        return Err(ExtractError::NoContent);
    }

    let json_ld = metadata::json_ld(&document);
    let published_date = metadata::declared_published_date(&document, &json_ld)
        .or_else(|| metadata::published_date(&document, &json_ld));

    Ok(ExtractedArticle {
        title: metadata::title(&document),
        excerpt: first_paragraph_excerpt(&body_html, config.excerpt_length),
        author: metadata::author(&document, &json_ld),
        published_date,
        body_html,
        method: ExtractionMethod::Structured,
        success: true,
        source_url: url.to_string(),
    })
}
