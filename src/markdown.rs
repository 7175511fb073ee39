//! # Markdown Renderer Module
//!
//! Turns an [`ExtractedArticle`] plus caller-supplied [`LinkMetadata`] into a
//! markdown note with a YAML frontmatter block.
//!
//! The frontmatter layout is consumed by note-taking tools and is fixed:
//!
//! ```text
//! ---
//! title: Hello World
//! source: "https://example.com/hello"
//! author: Jane Doe
//! published: 2024-03-05
//! created: 2024-06-01
//! description: First paragraph of the article...
//! tags:
//!   - clippings
//! ---
//! # Hello World
//! ```
//!
//! Fields without a value are emitted bare (`author:`). `last_crawled`,
//! `domain` and `pocket_status` follow the tags only when the caller
//! supplied them. Rendering is pure: [`render_at`] takes the creation date
//! explicitly and [`render`] uses today's UTC date.

mod error;
mod yaml;

pub use error::RenderError;
pub use yaml::{escape_yaml_value, quote_yaml_value};

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use htmd::HtmlToMarkdown;
use htmd::options::{BulletListMarker, HeadingStyle, Options};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::extractor::{ExtractedArticle, collapse_whitespace};

/// Tag emitted when the caller supplied none
pub const DEFAULT_TAG: &str = "clippings";

/// Caller-supplied metadata about a saved link
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkMetadata {
    /// Title saved with the link
    pub title: Option<String>,

    /// Tags saved with the link
    pub tags: Vec<String>,

    /// When the link was saved
    pub date_saved: Option<DateTime<Utc>>,

    /// When the link was last crawled
    pub crawl_date: Option<DateTime<Utc>>,

    /// Domain of the link
    pub domain: Option<String>,

    /// Read-later status, e.g. `unread` or `archive`
    pub pocket_status: Option<String>,

    /// Publication date known from elsewhere
    pub published_date: Option<DateTime<FixedOffset>>,

    /// Description saved with the link
    pub description: Option<String>,

    /// Excerpt saved with the link
    pub excerpt: Option<String>,

    /// Author saved with the link
    pub author: Option<String>,
}

/// Value of a single frontmatter field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrontmatterValue {
    /// No value; emitted as a bare `key:`
    Empty,
    /// Text, escaped on output
    Text(String),
    /// Text that is always double-quoted
    Quoted(String),
    /// Calendar date, emitted as `YYYY-MM-DD`
    Date(NaiveDate),
    /// Block list of escaped items
    List(Vec<String>),
}

impl FrontmatterValue {
    fn text(value: Option<&str>) -> Self {
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            Some(v) => FrontmatterValue::Text(v.to_string()),
            None => FrontmatterValue::Empty,
        }
    }

    fn date(value: Option<NaiveDate>) -> Self {
        value.map_or(FrontmatterValue::Empty, FrontmatterValue::Date)
    }

    /// The unescaped scalar value, if this is a scalar
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FrontmatterValue::Text(v) | FrontmatterValue::Quoted(v) => Some(v),
            _ => None,
        }
    }

    fn write_field(&self, key: &str, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrontmatterValue::Empty => writeln!(f, "{}:", key),
            FrontmatterValue::Text(v) => writeln!(f, "{}: {}", key, escape_yaml_value(v)),
            FrontmatterValue::Quoted(v) => writeln!(f, "{}: {}", key, quote_yaml_value(v)),
            FrontmatterValue::Date(d) => writeln!(f, "{}: {}", key, d.format("%Y-%m-%d")),
            FrontmatterValue::List(items) => {
                writeln!(f, "{}:", key)?;
                for item in items {
                    writeln!(f, "  - {}", escape_yaml_value(item))?;
                }
                Ok(())
            }
        }
    }
}

/// A rendered markdown note
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownDocument {
    /// Frontmatter fields in output order
    pub frontmatter: Vec<(String, FrontmatterValue)>,

    /// Markdown body
    pub body_markdown: String,
}

impl MarkdownDocument {
    /// Look up a frontmatter field
    pub fn field(&self, key: &str) -> Option<&FrontmatterValue> {
        self.frontmatter
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Drop the frontmatter, keeping only the body
    pub fn without_frontmatter(mut self) -> Self {
        self.frontmatter.clear();
        self
    }

    /// Full note text: frontmatter block followed by the body
    pub fn to_markdown(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for MarkdownDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.frontmatter.is_empty() {
            writeln!(f, "---")?;
            for (key, value) in &self.frontmatter {
                value.write_field(key, f)?;
            }
            writeln!(f, "---")?;
        }
        f.write_str(&self.body_markdown)
    }
}

/// Convert HTML to markdown with ATX headings and `-` bullets
///
/// Script and style content is dropped, runs of blank lines collapse to one
/// and the result is trimmed.
pub fn html_to_markdown(html: &str) -> Result<String, RenderError> {
    let converter = HtmlToMarkdown::builder()
        .options(Options {
            heading_style: HeadingStyle::Atx,
            bullet_list_marker: BulletListMarker::Dash,
            ..Default::default()
        })
        .skip_tags(vec!["script", "style"])
        .build();

    let markdown = converter
        .convert(html)
        .map_err(|e| RenderError::Conversion(e.to_string()))?;

    Ok(collapse_blank_lines(&markdown))
}

fn collapse_blank_lines(markdown: &str) -> String {
    let mut lines = Vec::new();
    let mut prev_blank = false;
    for line in markdown.lines() {
        if line.trim().is_empty() {
            if !prev_blank {
                lines.push("");
            }
            prev_blank = true;
        } else {
            lines.push(line);
            prev_blank = false;
        }
    }
    lines.join("\n").trim().to_string()
}

/// Render an article with today's UTC date as the creation date
pub fn render(article: &ExtractedArticle, metadata: &LinkMetadata) -> Result<MarkdownDocument, RenderError> {
    render_at(article, metadata, Utc::now().date_naive())
}

/// Render an article with an explicit creation date
pub fn render_at(
    article: &ExtractedArticle,
    metadata: &LinkMetadata,
    created: NaiveDate,
) -> Result<MarkdownDocument, RenderError> {
    if article.body_html.trim().is_empty() {
        return Err(RenderError::EmptyBody);
    }
    let body_markdown = html_to_markdown(&article.body_html)?;
    if body_markdown.is_empty() {
        return Err(RenderError::EmptyMarkdown);
    }

    Ok(MarkdownDocument {
        frontmatter: frontmatter(article, metadata, created),
        body_markdown,
    })
}

fn first_present<'a>(candidates: &[Option<&'a str>]) -> Option<&'a str> {
    candidates
        .iter()
        .flatten()
        .copied()
        .find(|v| !v.trim().is_empty())
}

fn frontmatter(
    article: &ExtractedArticle,
    metadata: &LinkMetadata,
    created: NaiveDate,
) -> Vec<(String, FrontmatterValue)> {
    let title = first_present(&[article.title.as_deref(), metadata.title.as_deref()]);
    let author = first_present(&[article.author.as_deref(), metadata.author.as_deref()]);
    let published = article
        .published_date
        .or(metadata.published_date)
        .map(|d| d.date_naive());
    let description = first_present(&[
        article.excerpt.as_deref(),
        metadata.description.as_deref(),
        metadata.excerpt.as_deref(),
    ])
    .map(collapse_whitespace);

    // supplied-but-blank tags leave the list empty; only no tags at all gets the default
    let tags = if metadata.tags.is_empty() {
        vec![DEFAULT_TAG.to_string()]
    } else {
        metadata
            .tags
            .iter()
            .map(|tag| tag.trim())
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect()
    };

    let mut fields = vec![
        ("title", FrontmatterValue::text(title)),
        ("source", FrontmatterValue::Quoted(article.source_url.clone())),
        ("author", FrontmatterValue::text(author)),
        ("published", FrontmatterValue::date(published)),
        ("created", FrontmatterValue::Date(created)),
        ("description", FrontmatterValue::text(description.as_deref())),
        ("tags", FrontmatterValue::List(tags)),
    ];

    if let Some(crawled) = metadata.crawl_date {
        fields.push(("last_crawled", FrontmatterValue::Date(crawled.date_naive())));
    }
    if let Some(domain) = metadata.domain.as_deref().filter(|v| !v.trim().is_empty()) {
        fields.push(("domain", FrontmatterValue::Text(domain.to_string())));
    }
    if let Some(status) = metadata.pocket_status.as_deref().filter(|v| !v.trim().is_empty()) {
        fields.push(("pocket_status", FrontmatterValue::Text(status.to_string())));
    }

    fields
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}
