//! Link quality scoring
//!
//! An additive 0-100 rubric over how a link fetched and what could be
//! pulled from it:
//!
//! | Signal | Points |
//! |---|---|
//! | status 200 / other 2xx / 4xx | 40 / 30 / 10 |
//! | no redirects / 1-3 redirects | 10 / 5 |
//! | content extracted | 20 |
//! | markdown rendered | 20 |

use serde::{Deserialize, Serialize};

use crate::fetcher::FetchResult;

/// Highest possible score
pub const MAX_SCORE: u8 = 100;

/// Score a link from its crawl outcome
pub fn score(status_code: Option<u16>, redirect_count: u32, has_content: bool, has_markdown: bool) -> u8 {
    let status_points: u32 = match status_code {
        Some(200) => 40,
        Some(200..=299) => 30,
        Some(400..=499) => 10,
        _ => 0,
    };
    let redirect_points: u32 = match redirect_count {
        0 => 10,
        1..=3 => 5,
        _ => 0,
    };
    let content_points: u32 = if has_content { 20 } else { 0 };
    let markdown_points: u32 = if has_markdown { 20 } else { 0 };

    let total = status_points + redirect_points + content_points + markdown_points;
    total.min(MAX_SCORE as u32) as u8
}

/// Derived quality signals for a link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityReport {
    /// Score from [`score`]
    pub score: u8,

    /// The final response was a 2xx
    pub is_accessible: bool,

    /// At least one redirect was followed
    pub has_redirects: bool,

    /// Article content was extracted
    pub has_content: bool,

    /// A markdown note was rendered
    pub has_markdown: bool,
}

impl QualityReport {
    /// Assess a fetch together with what the rest of the pipeline produced
    pub fn assess(result: &FetchResult, has_content: bool, has_markdown: bool) -> Self {
        Self {
            score: score(result.status_code, result.redirect_count, has_content, has_markdown),
            is_accessible: result.status_code.is_some_and(|code| (200..300).contains(&code)),
            has_redirects: result.redirect_count > 0,
            has_content,
            has_markdown,
        }
    }
}
