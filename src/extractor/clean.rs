//! Cleaned-HTML serialization
//!
//! Rebuilds the markup under a content container keeping only content
//! elements. Layout wrappers are unwrapped, boilerplate subtrees are dropped
//! and only `href`, `src` and `alt` attributes survive.

use scraper::{ElementRef, Html, Node, Selector};
use url::Url;

use super::metadata::collapse_whitespace;

/// Elements dropped together with their whole subtree
const DROP_TAGS: &[&str] = &[
    "script", "style", "noscript", "template", "nav", "aside", "footer", "header", "form",
    "button", "input", "select", "textarea", "label", "iframe", "object", "embed", "svg",
    "canvas", "dialog", "menu", "link", "meta",
];

/// Class and id fragments that mark boilerplate blocks
const BOILERPLATE_HINTS: &[&str] = &[
    "share", "social", "comment", "related", "newsletter", "subscribe", "advert", "promo",
    "sidebar", "breadcrumb", "cookie", "popup", "modal", "paywall",
];

/// Elements kept with their tag name
const KEEP_TAGS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol", "li", "blockquote", "pre", "code",
    "em", "strong", "b", "i", "u", "s", "del", "mark", "sup", "sub", "a", "img", "figure",
    "figcaption", "table", "thead", "tbody", "tfoot", "tr", "th", "td", "caption", "dl", "dt",
    "dd", "br", "hr",
];

/// Kept elements that never have content
const VOID_TAGS: &[&str] = &["img", "br", "hr"];

/// Unwrapped elements that still separate blocks of text
const BLOCK_WRAPPERS: &[&str] = &["div", "section", "article", "main", "body", "center"];

fn is_dropped(element: ElementRef<'_>) -> bool {
    let value = element.value();
    if DROP_TAGS.contains(&value.name()) {
        return true;
    }

    let mut markers = value.classes().map(str::to_lowercase).collect::<Vec<_>>();
    if let Some(id) = value.id() {
        markers.push(id.to_lowercase());
    }
    markers
        .iter()
        .any(|marker| BOILERPLATE_HINTS.iter().any(|hint| marker.contains(hint)))
}

/// Serializer for the content under a container element
pub(super) struct Cleaner<'a> {
    base: Option<&'a Url>,
}

impl<'a> Cleaner<'a> {
    /// Create a cleaner; links are resolved against `base` when given
    pub(super) fn new(base: Option<&'a Url>) -> Self {
        Self { base }
    }

    /// Serialize the children of `container` as cleaned HTML
    pub(super) fn clean(&self, container: ElementRef<'_>) -> String {
        let mut out = String::new();
        self.write_children(container, &mut out);
        out.trim().to_string()
    }

    fn write_children(&self, element: ElementRef<'_>, out: &mut String) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => out.push_str(&escape_text(text)),
                Node::Element(_) => {
                    if let Some(child) = ElementRef::wrap(child) {
                        self.write_element(child, out);
                    }
                }
                _ => {}
            }
        }
    }

    fn write_element(&self, element: ElementRef<'_>, out: &mut String) {
        if is_dropped(element) {
            return;
        }

        let name = element.value().name();
        if !KEEP_TAGS.contains(&name) {
            let block = BLOCK_WRAPPERS.contains(&name);
            if block {
                out.push('\n');
            }
            self.write_children(element, out);
            if block {
                out.push('\n');
            }
            return;
        }

        let attrs = match name {
            "a" => match self.link(element.value().attr("href")) {
                Some(href) => format!(" href=\"{}\"", escape_attr(&href)),
                None => {
                    // anchors without a usable target keep only their text
                    self.write_children(element, out);
                    return;
                }
            },
            "img" => {
                let src = element
                    .value()
                    .attr("src")
                    .or_else(|| element.value().attr("data-src"))
                    .and_then(|src| self.link(Some(src)));
                let Some(src) = src else {
                    return;
                };
                let mut attrs = format!(" src=\"{}\"", escape_attr(&src));
                if let Some(alt) = element.value().attr("alt") {
                    attrs.push_str(&format!(" alt=\"{}\"", escape_attr(alt)));
                }
                attrs
            }
            _ => String::new(),
        };

        if VOID_TAGS.contains(&name) {
            out.push_str(&format!("<{}{}>", name, attrs));
            return;
        }

        let mut inner = String::new();
        self.write_children(element, &mut inner);
        if inner.trim().is_empty() && !inner.contains("<img") {
            return;
        }

        out.push_str(&format!("<{}{}>{}</{}>", name, attrs, inner, name));
        if is_block(name) {
            out.push('\n');
        }
    }

    fn link(&self, raw: Option<&str>) -> Option<String> {
        let raw = raw?.trim();
        if raw.is_empty() || raw.starts_with("javascript:") {
            return None;
        }
        match self.base {
            Some(base) => base.join(raw).ok().map(String::from),
            None => Some(raw.to_string()),
        }
    }
}

fn is_block(name: &str) -> bool {
    !matches!(
        name,
        "a" | "em" | "strong" | "b" | "i" | "u" | "s" | "del" | "mark" | "sup" | "sub" | "code"
    )
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                out.push_str(text);
                out.push(' ');
            }
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    if !is_dropped(child) {
                        collect_text(child, out);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Readable text under an element, skipping boilerplate, whitespace collapsed
pub(super) fn visible_text(element: ElementRef<'_>) -> String {
    let mut text = String::new();
    collect_text(element, &mut text);
    collapse_whitespace(&text)
}

/// Text of the first non-empty paragraph, cut to `max_chars` plus `...`
pub(super) fn first_paragraph_excerpt(html: &str, max_chars: usize) -> Option<String> {
    let fragment = Html::parse_fragment(html);
    let selector = Selector::parse("p").ok()?;

    let paragraph = fragment
        .select(&selector)
        .map(|p| collapse_whitespace(&p.text().collect::<String>()))
        .find(|text| !text.is_empty())?;

    Some(truncate_chars(&paragraph, max_chars))
}

/// Cut `text` to `max_chars` characters, marking the cut with `...`
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn escape_attr(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean(html: &str, base: Option<&Url>) -> String {
        let document = Html::parse_document(html);
        let body = Selector::parse("body").unwrap();
        let body = document.select(&body).next().unwrap();
        Cleaner::new(base).clean(body)
    }

    #[test]
    fn test_drops_boilerplate() {
        let html = r#"<body>
            <nav><a href="/">Home</a></nav>
            <div class="share-buttons"><a href="https://twitter.com">Tweet</a></div>
            <p>Real <em>content</em> here.</p>
            <script>var x = 1;</script>
            <section id="comments"><p>First!</p></section>
            </body>"#;
        let cleaned = clean(html, None);

        assert!(cleaned.contains("<p>Real <em>content</em> here.</p>"));
        assert!(!cleaned.contains("Home"));
        assert!(!cleaned.contains("Tweet"));
        assert!(!cleaned.contains("var x"));
        assert!(!cleaned.contains("First!"));
    }

    #[test]
    fn test_unwraps_layout_and_strips_attributes() {
        let html = r#"<body><div class="wrap"><span style="color:red">Hello</span>
            <p class="lead" data-x="1">Para</p></div></body>"#;
        let cleaned = clean(html, None);

        assert!(cleaned.contains("Hello"));
        assert!(cleaned.contains("<p>Para</p>"));
        assert!(!cleaned.contains("class="));
        assert!(!cleaned.contains("<span"));
    }

    #[test]
    fn test_resolves_links_and_images() {
        let base = Url::parse("https://example.com/blog/post").unwrap();
        let html = r#"<body><p><a href="../about">About</a> <a href="javascript:void(0)">Click</a>
            <img src="/img/a.png" alt="A &quot;pic&quot;"></p></body>"#;
        let cleaned = clean(html, Some(&base));

        assert!(cleaned.contains(r#"<a href="https://example.com/about">About</a>"#));
        assert!(cleaned.contains("Click"));
        assert!(!cleaned.contains("javascript"));
        assert!(cleaned.contains(r#"<img src="https://example.com/img/a.png" alt="A &quot;pic&quot;">"#));
    }

    #[test]
    fn test_escapes_text() {
        let cleaned = clean("<body><p>1 &lt; 2 &amp; 3</p></body>", None);
        assert_eq!(cleaned, "<p>1 &lt; 2 &amp; 3</p>");
    }

    #[test]
    fn test_skips_empty_elements() {
        let cleaned = clean("<body><p>  </p><p>kept</p></body>", None);
        assert_eq!(cleaned, "<p>kept</p>");
    }

    #[test]
    fn test_visible_text() {
        let document = Html::parse_document(
            "<body><p>One  two</p><script>ignored()</script><aside>side</aside><p>three</p></body>",
        );
        let body = Selector::parse("body").unwrap();
        let body = document.select(&body).next().unwrap();
        assert_eq!(visible_text(body), "One two three");
    }

    #[test]
    fn test_first_paragraph_excerpt() {
        let html = "<p> </p><p>First   real\nparagraph.</p><p>Second.</p>";
        assert_eq!(
            first_paragraph_excerpt(html, 300).as_deref(),
            Some("First real paragraph.")
        );

        let long = format!("<p>{}</p>", "x".repeat(350));
        let excerpt = first_paragraph_excerpt(&long, 300).unwrap();
        assert_eq!(excerpt.len(), 303);
        assert!(excerpt.ends_with("..."));

        let exact = format!("<p>{}</p>", "y".repeat(300));
        assert_eq!(first_paragraph_excerpt(&exact, 300).unwrap().len(), 300);

        assert_eq!(first_paragraph_excerpt("<div>no paragraphs</div>", 300), None);
    }
}
