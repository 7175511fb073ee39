//! Page-level metadata: title, author and publication date
//!
//! Publication dates are found by scanning known metadata locations in a fixed
//! priority order. The first value that parses wins; values that fail to parse
//! are skipped. Sources are not cross-checked against each other, so a page
//! with inconsistent metadata yields whichever date comes first.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use std::sync::OnceLock;

/// `<meta>` locations that may hold a publication date, in priority order
const DATE_META: &[(&str, &str)] = &[
    ("property", "article:published_time"),
    ("property", "og:published_time"),
    ("property", "article:published"),
    ("name", "article:published_time"),
    ("name", "date"),
    ("name", "pubdate"),
    ("name", "publishdate"),
    ("name", "publication-date"),
    ("itemprop", "datePublished"),
    ("itemprop", "datepublished"),
];

/// JSON-LD keys that may hold a publication date, in priority order
const JSON_LD_DATE_KEYS: &[&str] = &["datePublished", "datepublished", "date"];

/// JSON-LD `@type` values treated as the article itself
const ARTICLE_TYPES: &[&str] = &[
    "Article",
    "NewsArticle",
    "BlogPosting",
    "Report",
    "ScholarlyArticle",
    "TechArticle",
];

const MAX_AUTHOR_CHARS: usize = 100;

fn select_all<'a>(document: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => document.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

/// Collapse runs of whitespace into single spaces
pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn non_empty(text: &str) -> Option<String> {
    let text = collapse_whitespace(text);
    if text.is_empty() { None } else { Some(text) }
}

/// All non-empty `content` values of `<meta {attr}="{value}">`
pub(super) fn meta_values(document: &Html, attr: &str, value: &str) -> Vec<String> {
    select_all(document, &format!("meta[{}=\"{}\"]", attr, value))
        .into_iter()
        .filter_map(|meta| meta.value().attr("content"))
        .filter_map(non_empty)
        .collect()
}

fn first_meta(document: &Html, attr: &str, value: &str) -> Option<String> {
    meta_values(document, attr, value).into_iter().next()
}

fn first_text(document: &Html, css: &str) -> Option<String> {
    select_all(document, css)
        .into_iter()
        .find_map(|element| non_empty(&element.text().collect::<String>()))
}

/// Parsed JSON-LD blocks of the page; blocks that fail to parse are skipped
pub(super) fn json_ld(document: &Html) -> Vec<Value> {
    select_all(document, "script[type=\"application/ld+json\"]")
        .into_iter()
        .filter_map(|script| serde_json::from_str(&script.text().collect::<String>()).ok())
        .collect()
}

/// Top-level JSON-LD objects, unwrapping arrays and `@graph` containers
fn json_ld_objects(values: &[Value]) -> Vec<&serde_json::Map<String, Value>> {
    let mut objects = Vec::new();
    for value in values {
        match value {
            Value::Array(items) => objects.extend(items.iter().filter_map(Value::as_object)),
            Value::Object(map) => {
                objects.push(map);
                if let Some(Value::Array(graph)) = map.get("@graph") {
                    objects.extend(graph.iter().filter_map(Value::as_object));
                }
            }
            _ => {}
        }
    }
    objects
}

fn is_article_object(object: &serde_json::Map<String, Value>) -> bool {
    match object.get("@type") {
        Some(Value::String(kind)) => ARTICLE_TYPES.contains(&kind.as_str()),
        Some(Value::Array(kinds)) => kinds
            .iter()
            .filter_map(Value::as_str)
            .any(|kind| ARTICLE_TYPES.contains(&kind)),
        _ => false,
    }
}

/// Page title: og:title, twitter:title, `<title>`, then the first `<h1>`
pub(super) fn title(document: &Html) -> Option<String> {
    first_meta(document, "property", "og:title")
        .or_else(|| first_meta(document, "name", "twitter:title"))
        .or_else(|| first_text(document, "title"))
        .or_else(|| first_text(document, "h1"))
}

/// Author name from meta tags, microdata, JSON-LD or a `rel=author` link
pub(super) fn author(document: &Html, json_ld: &[Value]) -> Option<String> {
    let candidates = [
        first_meta(document, "name", "author"),
        first_meta(document, "property", "article:author").filter(|a| !a.starts_with("http")),
        microdata_author(document),
        json_ld_author(json_ld),
        first_text(document, "[rel=\"author\"]"),
    ];

    candidates
        .into_iter()
        .flatten()
        .find(|author| author.chars().count() < MAX_AUTHOR_CHARS)
}

fn microdata_author(document: &Html) -> Option<String> {
    select_all(document, "[itemprop=\"author\"]")
        .into_iter()
        .find_map(|element| {
            element
                .value()
                .attr("content")
                .and_then(non_empty)
                .or_else(|| {
                    let name = Selector::parse("[itemprop=\"name\"]").ok()?;
                    element
                        .select(&name)
                        .find_map(|n| non_empty(&n.text().collect::<String>()))
                })
                .or_else(|| non_empty(&element.text().collect::<String>()))
        })
}

fn json_ld_author(values: &[Value]) -> Option<String> {
    fn name_of(value: &Value) -> Option<String> {
        match value {
            Value::String(name) => non_empty(name),
            Value::Object(map) => map.get("name").and_then(Value::as_str).and_then(non_empty),
            Value::Array(items) => items.iter().find_map(name_of),
            _ => None,
        }
    }

    json_ld_objects(values)
        .into_iter()
        .filter_map(|object| object.get("author"))
        .find_map(name_of)
}

/// Publication date declared by article-typed JSON-LD or microdata
pub(super) fn declared_published_date(document: &Html, json_ld: &[Value]) -> Option<DateTime<FixedOffset>> {
    json_ld_objects(json_ld)
        .into_iter()
        .filter(|object| is_article_object(object))
        .filter_map(|object| object.get("datePublished").and_then(Value::as_str))
        .find_map(parse_date)
        .or_else(|| {
            select_all(document, "[itemprop=\"datePublished\"]")
                .into_iter()
                .filter_map(|element| {
                    element
                        .value()
                        .attr("content")
                        .or_else(|| element.value().attr("datetime"))
                })
                .find_map(parse_date)
        })
}

/// Scan the known publication-date locations in priority order
///
/// Order: date `<meta>` tags, JSON-LD `datePublished`/`datepublished`/`date`,
/// then `<time datetime>` elements.
pub(super) fn published_date(document: &Html, json_ld: &[Value]) -> Option<DateTime<FixedOffset>> {
    DATE_META
        .iter()
        .flat_map(|(attr, value)| meta_values(document, attr, value))
        .find_map(|content| parse_date(&content))
        .or_else(|| json_ld_date(json_ld))
        .or_else(|| {
            select_all(document, "time[datetime]")
                .into_iter()
                .filter_map(|time| time.value().attr("datetime"))
                .find_map(parse_date)
        })
}

fn json_ld_date(values: &[Value]) -> Option<DateTime<FixedOffset>> {
    let mut objects = Vec::new();
    for value in values {
        match value {
            Value::Array(items) => objects.extend(items.iter().filter_map(Value::as_object)),
            Value::Object(map) => objects.push(map),
            _ => {}
        }
    }

    objects.into_iter().find_map(|object| {
        JSON_LD_DATE_KEYS
            .iter()
            .find_map(|key| object.get(*key).and_then(Value::as_str).filter(|s| !s.trim().is_empty()))
            .and_then(parse_date)
    })
}

/// Parse a date string in any of the common web formats
///
/// RFC 3339 and RFC 2822 are tried first, then a list of explicit layouts,
/// then `dateparser` for looser forms. Leading weekday names and ordinal
/// suffixes ("5th") are ignored. Values without an explicit offset are taken
/// as UTC and numeric day/month layouts are read month first.
pub fn parse_date(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt);
    }

    const OFFSET_FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%z",
        "%Y-%m-%dT%H:%M:%S%.f%z",
        "%Y-%m-%d %H:%M:%S%z",
        "%Y-%m-%dT%H:%M%z",
    ];
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }

    let utc = FixedOffset::east_opt(0)?;
    let value = loosen(value);
    let value = value.as_str();

    const NAIVE_DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
        "%B %d, %Y %I:%M %p",
        "%B %d, %Y %H:%M",
    ];
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(DateTime::from_naive_utc_and_offset(naive, utc));
        }
    }

    const DATE_FORMATS: &[&str] = &[
        "%Y-%m-%d",
        "%Y/%m/%d",
        "%Y%m%d",
        "%m/%d/%Y",
        "%B %d, %Y",
        "%B %d %Y",
        "%d %B %Y",
        "%d %B, %Y",
    ];
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            let naive = date.and_hms_opt(0, 0, 0)?;
            return Some(DateTime::from_naive_utc_and_offset(naive, utc));
        }
    }

    let midnight = NaiveTime::from_hms_opt(0, 0, 0)?;
    dateparser::parse_with(value, &Utc, midnight)
        .ok()
        .map(|dt| dt.with_timezone(&utc))
}

/// Strip a leading weekday and ordinal day suffixes
fn loosen(value: &str) -> String {
    static WEEKDAY: OnceLock<Regex> = OnceLock::new();
    static ORDINAL: OnceLock<Regex> = OnceLock::new();

    let weekday = WEEKDAY.get_or_init(|| {
        Regex::new(r"(?i)^(mon|tue|wed|thu|fri|sat|sun)[a-z]*\.?,?\s+").expect("static regex")
    });
    let ordinal = ORDINAL
        .get_or_init(|| Regex::new(r"(?i)\b(\d{1,2})(st|nd|rd|th)\b").expect("static regex"));

    let value = weekday.replace(value, "");
    ordinal.replace_all(&value, "$1").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    fn date_of(html: &str) -> Option<String> {
        let document = Html::parse_document(html);
        let ld = json_ld(&document);
        published_date(&document, &ld).map(|d| d.format("%Y-%m-%d").to_string())
    }

    #[test]
    fn test_parse_date_formats() {
        let cases = [
            ("2024-03-05T10:00:00Z", (2024, 3, 5)),
            ("2024-03-05T10:00:00+02:00", (2024, 3, 5)),
            ("2024-03-05T23:30:00-05:00", (2024, 3, 5)),
            ("Tue, 05 Mar 2024 10:00:00 GMT", (2024, 3, 5)),
            ("2024-03-05 10:00:00", (2024, 3, 5)),
            ("2024-03-05", (2024, 3, 5)),
            ("2024/03/05", (2024, 3, 5)),
            ("March 5, 2024", (2024, 3, 5)),
            ("5 March 2024", (2024, 3, 5)),
        ];
        for (input, (y, m, d)) in cases {
            let parsed = parse_date(input).unwrap_or_else(|| panic!("failed to parse {input}"));
            assert_eq!((parsed.year(), parsed.month(), parsed.day()), (y, m, d), "{input}");
        }
    }

    #[test]
    fn test_parse_loose_dates() {
        let cases = [
            ("Mar 5, 2024 10:30 AM", "2024-03-05T10:30:00+00:00"),
            ("Tuesday, March 5, 2024", "2024-03-05T00:00:00+00:00"),
            ("20240305", "2024-03-05T00:00:00+00:00"),
            ("March 5th, 2024", "2024-03-05T00:00:00+00:00"),
            ("05/03/2024", "2024-05-03T00:00:00+00:00"),
            ("2014-04-26 05:24:37 PM", "2014-04-26T17:24:37+00:00"),
            ("12 Feb 2006, 19:17", "2006-02-12T19:17:00+00:00"),
        ];
        for (input, expected) in cases {
            let parsed = parse_date(input).unwrap_or_else(|| panic!("failed to parse {input}"));
            assert_eq!(parsed.to_rfc3339(), expected, "{input}");
        }
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert!(parse_date("").is_none());
        assert!(parse_date("yesterday").is_none());
        assert!(parse_date("2024-13-45").is_none());
    }

    #[test]
    fn test_meta_tags_take_priority() {
        let html = r#"<html><head>
            <meta name="date" content="2020-01-01">
            <meta property="article:published_time" content="2021-06-15T08:00:00Z">
            </head><body><time datetime="2019-01-01">then</time></body></html>"#;
        assert_eq!(date_of(html).as_deref(), Some("2021-06-15"));
    }

    #[test]
    fn test_unparseable_dates_are_skipped() {
        let html = r#"<html><head>
            <meta property="article:published_time" content="sometime last week">
            <meta name="pubdate" content="2022-02-02">
            </head><body></body></html>"#;
        assert_eq!(date_of(html).as_deref(), Some("2022-02-02"));
    }

    #[test]
    fn test_json_ld_date() {
        let html = r#"<html><head>
            <script type="application/ld+json">{ not json</script>
            <script type="application/ld+json">[{"@type":"Article","datePublished":"2023-07-04T12:00:00Z"}]</script>
            </head><body><time datetime="2019-01-01">then</time></body></html>"#;
        assert_eq!(date_of(html).as_deref(), Some("2023-07-04"));
    }

    #[test]
    fn test_time_element_is_last_resort() {
        let html = r#"<html><body><p>Posted <time datetime="2018-11-30">Nov 30</time></p></body></html>"#;
        assert_eq!(date_of(html).as_deref(), Some("2018-11-30"));
        assert_eq!(date_of("<html><body><p>No dates</p></body></html>"), None);
    }

    #[test]
    fn test_declared_date_reads_graph() {
        let html = r#"<html><head><script type="application/ld+json">
            {"@context":"https://schema.org","@graph":[
                {"@type":"WebSite","name":"Blog"},
                {"@type":"BlogPosting","datePublished":"2017-05-01"}
            ]}</script></head><body></body></html>"#;
        let document = Html::parse_document(html);
        let ld = json_ld(&document);
        let date = declared_published_date(&document, &ld).unwrap();
        assert_eq!(date.format("%Y-%m-%d").to_string(), "2017-05-01");
    }

    #[test]
    fn test_title_priority() {
        let document = Html::parse_document(
            r#"<html><head><title>Site | Post</title><meta property="og:title" content="Post"></head>
            <body><h1>Heading</h1></body></html>"#,
        );
        assert_eq!(title(&document).as_deref(), Some("Post"));

        let document = Html::parse_document("<html><body><h1>  Only\n heading </h1></body></html>");
        assert_eq!(title(&document).as_deref(), Some("Only heading"));
    }

    #[test]
    fn test_author_sources() {
        let document = Html::parse_document(
            r#"<html><head><meta name="author" content="Ada Lovelace"></head><body></body></html>"#,
        );
        assert_eq!(author(&document, &[]).as_deref(), Some("Ada Lovelace"));

        let document = Html::parse_document(
            r#"<html><head><script type="application/ld+json">
            {"@type":"NewsArticle","author":[{"@type":"Person","name":"Grace Hopper"}]}
            </script></head><body></body></html>"#,
        );
        let ld = json_ld(&document);
        assert_eq!(author(&document, &ld).as_deref(), Some("Grace Hopper"));

        let document = Html::parse_document(
            r#"<html><body><span itemprop="author"><span itemprop="name">Alan Turing</span></span></body></html>"#,
        );
        assert_eq!(author(&document, &[]).as_deref(), Some("Alan Turing"));

        let document = Html::parse_document("<html><body><p>anonymous</p></body></html>");
        assert_eq!(author(&document, &[]), None);
    }
}
