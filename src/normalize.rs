//! URL normalization
//!
//! Strips `utm_*` campaign-tracking parameters from a URL's query string and
//! from query-style fragments (`#utm_source=newsletter&utm_medium=email`).
//! Every other parameter is kept byte-for-byte and in its original order,
//! blank values included. Normalization fails open: input that cannot be
//! parsed comes back unchanged.

use regex::Regex;
use std::sync::OnceLock;
use url::{Url, form_urlencoded};

const TRACKING_PREFIX: &str = "utm_";

fn tracking_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)[?&#]utm_").expect("static regex"))
}

/// Check whether a URL appears to carry `utm_*` parameters
pub fn has_tracking_params(url: &str) -> bool {
    tracking_pattern().is_match(url)
}

/// Remove all `utm_*` parameters from a URL's query and fragment
///
/// # Examples
///
/// ```
/// use linkvault::normalize::normalize;
///
/// assert_eq!(
///     normalize("https://x.com/a?utm_source=g&id=1#utm_medium=e"),
///     "https://x.com/a?id=1"
/// );
/// ```
pub fn normalize(url: &str) -> String {
    if !has_tracking_params(url) {
        return url.to_string();
    }

    let mut parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(_) => return url.to_string(),
    };

    if let Some(query) = parsed.query().map(str::to_string) {
        match strip_tracking(&query) {
            Some(cleaned) => parsed.set_query(Some(&cleaned)),
            None => parsed.set_query(None),
        }
    }

    if let Some(fragment) = parsed.fragment().map(str::to_string) {
        if fragment.to_lowercase().contains(TRACKING_PREFIX) {
            match strip_tracking(&fragment) {
                Some(cleaned) => parsed.set_fragment(Some(&cleaned)),
                None => parsed.set_fragment(None),
            }
        }
    }

    parsed.to_string()
}

/// Filter `key=value` segments, returning `None` when nothing is left
fn strip_tracking(params: &str) -> Option<String> {
    let kept: Vec<&str> = params
        .split('&')
        .filter(|segment| !segment.is_empty() && !is_tracking_segment(segment))
        .collect();

    if kept.is_empty() {
        None
    } else {
        Some(kept.join("&"))
    }
}

fn is_tracking_segment(segment: &str) -> bool {
    form_urlencoded::parse(segment.as_bytes())
        .next()
        .is_some_and(|(key, _)| key.to_lowercase().starts_with(TRACKING_PREFIX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_query_and_fragment_params() {
        assert_eq!(
            normalize("https://x.com/a?utm_source=g&id=1#utm_medium=e"),
            "https://x.com/a?id=1"
        );
        assert_eq!(
            normalize("https://example.com/page?utm_source=google&utm_medium=cpc&id=123"),
            "https://example.com/page?id=123"
        );
        assert_eq!(
            normalize("https://example.com/page#utm_source=newsletter&utm_medium=email"),
            "https://example.com/page"
        );
    }

    #[test]
    fn test_drops_empty_query() {
        assert_eq!(
            normalize("https://example.com/page?utm_campaign=spring"),
            "https://example.com/page"
        );
    }

    #[test]
    fn test_preserves_order_and_blank_values() {
        assert_eq!(
            normalize("https://example.com/?b=2&utm_term=x&a=&c=3"),
            "https://example.com/?b=2&a=&c=3"
        );
    }

    #[test]
    fn test_case_insensitive_keys() {
        assert_eq!(
            normalize("https://example.com/?UTM_Source=feed&ref=home"),
            "https://example.com/?ref=home"
        );
    }

    #[test]
    fn test_keeps_plain_fragments() {
        assert_eq!(
            normalize("https://example.com/post?utm_source=x#section-2"),
            "https://example.com/post#section-2"
        );
        assert_eq!(
            normalize("https://example.com/post#top&utm_medium=social"),
            "https://example.com/post#top"
        );
    }

    #[test]
    fn test_clean_urls_are_untouched() {
        let url = "https://example.com/search?q=rust+lang&page=2#results";
        assert_eq!(normalize(url), url);
    }

    #[test]
    fn test_unparseable_input_is_returned_unchanged() {
        assert_eq!(normalize("not a url?utm_source=x"), "not a url?utm_source=x");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "https://x.com/a?utm_source=g&id=1#utm_medium=e",
            "https://example.com/?b=2&utm_term=x&a=&c=3",
            "https://example.com/post#top&utm_medium=social",
            "https://example.com/plain",
            "garbage ?utm_x",
        ];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "not idempotent for {input}");
        }
    }

    #[test]
    fn test_has_tracking_params() {
        assert!(has_tracking_params("https://a.com/?utm_source=x"));
        assert!(has_tracking_params("https://a.com/?id=1&UTM_medium=x"));
        assert!(has_tracking_params("https://a.com/#utm_campaign=x"));
        assert!(!has_tracking_params("https://a.com/utm_source"));
        assert!(!has_tracking_params("https://a.com/?id=1"));
    }
}
